//! Fire: ignition from heat, burning, burning out.

use formica_core::components::{Body, EmitterState, FlammableState};
use formica_core::enums::{PheromoneKind, Tag};
use formica_core::events::SimEvent;

use crate::actions;
use crate::context::SimContext;
use crate::operations;

/// Burning entities start emitting heat on their first burning tick, burn
/// fuel, and die when it runs out. Others ignite once the heat at their cell
/// reaches the combustion temperature. Heat emitted this tick only reaches
/// the field through the worker, so neighbours react a tick or more later.
pub fn run(ctx: &mut SimContext) {
    let dt = ctx.dt();
    for id in ctx.store.tagged(Tag::Flammable) {
        let (Some(body), Some(mut state)) = (ctx.store.get::<Body>(id), ctx.store.get::<FlammableState>(id))
        else {
            continue;
        };
        let Some(profile) = ctx.registry.entity(body.kind).flammable.clone() else {
            continue;
        };

        if state.on_fire {
            let emitting = ctx
                .store
                .get::<EmitterState>(id)
                .map_or(0.0, |e| e.quantity);
            if emitting == 0.0 {
                if let Err(err) = operations::change_emitter_quantity(ctx, id, profile.heat_quantity) {
                    tracing::debug!(entity = %id, %err, "burning entity cannot emit heat");
                }
            }
            state.fuel_ms -= dt;
            ctx.store.insert_component(id, state);
            if state.fuel_ms <= 0.0 {
                actions::queue_die(ctx, id);
            }
        } else {
            let temperature = ctx.field.get(PheromoneKind::Heat, body.position);
            if temperature >= profile.combustion_temp && profile.can_ignite {
                state.on_fire = true;
                ctx.store.insert_component(id, state);
                tracing::debug!(entity = %id, temperature, "ignited");
                ctx.events.push(SimEvent::Ignited { id });
            }
        }
    }
}
