//! Agent bookkeeping: age counters, and idle agents choose what to do.

use formica_core::components::AgentState;
use formica_core::enums::Tag;

use crate::actions;
use crate::context::SimContext;
use crate::decide;

pub fn run(ctx: &mut SimContext) {
    let dt = ctx.dt();
    for id in ctx.store.tagged(Tag::Agent) {
        let tracked = ctx.store.with_mut::<AgentState, _>(id, |agent| {
            agent.age_ms += dt;
            agent.time_on_task_ms += dt;
            agent.prev_hp_age_ms += dt;
        });
        if tracked.is_none() {
            tracing::debug!(entity = %id, "agent tag without agent state");
            continue;
        }
        if actions::head_action(&ctx.store, id).is_none() && !ctx.doomed.contains(&id) {
            decide::decide(ctx, id);
        }
    }
}
