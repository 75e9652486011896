//! Read model for renderers.

use formica_core::components::*;
use formica_core::state::{EntityView, PlayerView, SimSnapshot};

use crate::actions;
use crate::context::SimContext;

/// Flatten the whole simulation into a [`SimSnapshot`], entities in id order.
pub fn build_snapshot(ctx: &SimContext) -> SimSnapshot {
    let store = &ctx.store;
    let entities = store
        .ids()
        .into_iter()
        .filter_map(|id| {
            let body = store.body(id)?;
            let hp = store.get::<Health>(id).map_or(0.0, |h| h.hp);
            let prev_action = store.get::<ActionQueue>(id).and_then(|q| q.prev_action);
            let tower = store.get::<TowerState>(id);
            let theta = tower
                .as_ref()
                .map(|t| t.theta)
                .or_else(|| store.get::<JetState>(id).map(|j| j.theta))
                .or_else(|| store.get::<BallisticState>(id).map(|b| b.heading));
            Some(EntityView {
                id,
                kind: body.kind,
                owner: body.owner,
                position: body.position,
                cont_pos: body.cont_pos,
                width: body.width,
                height: body.height,
                hp,
                action: actions::head_action(store, id).map(|a| a.kind),
                prev_action,
                theta,
                tile_mask: body.tile_mask,
                on_fire: store.get::<FlammableState>(id).is_some_and(|f| f.on_fire),
                tower_phase: tower.map(|t| t.phase),
                task: store.get::<AgentState>(id).map(|a| a.task),
                segments: store.segments(id),
            })
        })
        .collect();

    let players = ctx
        .players
        .iter()
        .map(|(id, player)| PlayerView {
            id: *id,
            resources: player.resources.clone(),
        })
        .collect();

    SimSnapshot {
        time: ctx.time,
        entities,
        pheromones: ctx.field.to_view(),
        players,
    }
}
