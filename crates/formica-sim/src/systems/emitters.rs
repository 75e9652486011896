//! Staggered emitter refresh.

use formica_core::components::EmitterState;
use formica_core::enums::Tag;
use formica_core::events::SimEvent;

use crate::context::SimContext;
use crate::operations;

/// An emitter re-asserts its quantity on ticks where
/// `(tick + id) % refresh_rate == 0`, spreading refreshes across ticks.
pub fn run(ctx: &mut SimContext) {
    let tick = ctx.time.tick;
    for id in ctx.store.tagged(Tag::PheromoneEmitter) {
        let Some(emitter) = ctx.store.get::<EmitterState>(id) else {
            continue;
        };
        if emitter.quantity == 0.0 {
            continue;
        }
        let Some(rate) = emitter.refresh_rate.filter(|r| *r > 0) else {
            continue;
        };
        if refresh_due(tick, id.0, rate) {
            if let Err(err) = operations::change_emitter_quantity(ctx, id, emitter.quantity) {
                tracing::debug!(entity = %id, %err, "emitter refresh failed");
                continue;
            }
            ctx.events.push(SimEvent::EmitterRefreshed {
                id,
                pheromone: emitter.pheromone,
                tick,
            });
        }
    }
}

pub fn refresh_due(tick: u64, id: u32, rate: u64) -> bool {
    (tick + u64::from(id)) % rate == 0
}
