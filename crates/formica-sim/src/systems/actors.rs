//! Action stepping for every entity in the actor set.

use std::collections::BTreeSet;

use formica_core::enums::Tag;
use formica_core::types::EntityId;

use crate::actions;
use crate::context::SimContext;

/// Step each actor once. Actors that join the set during the pass (for
/// example an explosive killed by another explosive) are visited in the
/// same pass. Actors whose queue ran dry leave the set only after the pass.
pub fn run(ctx: &mut SimContext) {
    ctx.store.take_new_actors();
    let mut worklist: Vec<EntityId> = ctx.store.tagged(Tag::Actor);
    let mut visited: BTreeSet<EntityId> = BTreeSet::new();
    let mut finished: Vec<EntityId> = Vec::new();

    let mut next = 0;
    while next < worklist.len() {
        let id = worklist[next];
        next += 1;
        if !visited.insert(id) {
            continue;
        }

        if actions::head_action(&ctx.store, id).is_some() {
            actions::step_action(ctx, id);
        }
        if actions::head_action(&ctx.store, id).is_none() {
            finished.push(id);
        }

        worklist.extend(ctx.store.take_new_actors());
    }

    for id in finished {
        // A later actor may have queued something for it.
        if actions::head_action(&ctx.store, id).is_none() {
            ctx.store.unmark_actor(id);
        }
    }
}
