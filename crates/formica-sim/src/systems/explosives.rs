//! Explosive fuses.

use formica_core::components::ExplosiveState;
use formica_core::enums::Tag;

use crate::actions;
use crate::context::SimContext;

/// Age every fuse; a fuse past its timer (or without one) queues `Die`,
/// whose effect is the explosion.
pub fn run(ctx: &mut SimContext) {
    let dt = ctx.dt();
    for id in ctx.store.tagged(Tag::Explosive) {
        let Some(state) = ctx.store.with_mut::<ExplosiveState, _>(id, |fuse| {
            fuse.age_ms += dt;
            *fuse
        }) else {
            continue;
        };
        let lit = state.timer_ms.map_or(true, |timer| state.age_ms > timer);
        if lit {
            actions::queue_die(ctx, id);
        }
    }
}
