//! Side effects fired by actions at their effect index.

use glam::DVec2;

use formica_core::components::{Action, ActionPayload, Body, JetState};
use formica_core::enums::{ActionKind, EntityKind, PheromoneKind, Tag};
use formica_core::events::SimEvent;
use formica_core::types::EntityId;
use formica_pheromone::PheromoneSource;

use crate::context::SimContext;
use crate::operations;

pub fn apply(ctx: &mut SimContext, id: EntityId, action: &Action) {
    match (action.kind, action.payload) {
        (ActionKind::Move, ActionPayload::Move { to }) => {
            if let Err(err) = operations::step_entity(ctx, id, to) {
                tracing::debug!(entity = %id, %err, "move skipped");
            }
        }
        (
            ActionKind::Shoot,
            ActionPayload::Shoot {
                theta,
                projectile,
                target,
            },
        ) => shoot(ctx, id, theta, projectile, target),
        (ActionKind::Die, _) => {
            if ctx.store.has_tag(id, Tag::Explosive) {
                explode(ctx, id);
            }
        }
        (ActionKind::Flip, _) => {
            ctx.store
                .with_mut::<JetState, _>(id, |jet| jet.flipped = !jet.flipped);
        }
        _ => {}
    }
}

/// Centre of a body in continuous coordinates.
pub fn centre(body: &Body) -> DVec2 {
    body.cont_pos + DVec2::new(body.width as f64, body.height as f64) / 2.0
}

fn shoot(
    ctx: &mut SimContext,
    id: EntityId,
    theta: f64,
    projectile: Option<EntityKind>,
    target: Option<EntityId>,
) {
    let Some(body) = ctx.store.body(id) else {
        return;
    };
    match projectile {
        Some(kind) => {
            match operations::spawn_projectile(ctx, kind, centre(&body), body.owner, theta, target) {
                Ok(_) => ctx.events.push(SimEvent::TowerFired {
                    tower: id,
                    projectile: kind,
                    theta,
                }),
                Err(err) => tracing::debug!(entity = %id, %err, "projectile not spawned"),
            }
        }
        None => {
            // Direct strike on an adjacent target.
            let Some(target) = target.filter(|t| ctx.store.contains(*t)) else {
                return;
            };
            let damage = ctx.registry.entity(body.kind).damage;
            operations::deal_damage(ctx, target, damage);
        }
    }
}

/// Damage everything within the blast radius and leave heat at the blast cell.
fn explode(ctx: &mut SimContext, id: EntityId) {
    let Some(body) = ctx.store.body(id) else {
        return;
    };
    let Some(blast) = ctx.registry.entity(body.kind).explosive.clone() else {
        return;
    };

    for other in ctx.store.ids() {
        if other == id {
            continue;
        }
        let Some(other_body) = ctx.store.body(other) else {
            continue;
        };
        if body.position.distance(&other_body.position) <= blast.blast_radius {
            operations::deal_damage(ctx, other, blast.damage);
        }
    }

    let heat = ctx.field.max_quantity(PheromoneKind::Heat);
    ctx.field.set(PheromoneKind::Heat, body.position, heat);
    ctx.pending
        .flood
        .push(PheromoneSource::new(PheromoneKind::Heat, body.position, heat));

    tracing::debug!(entity = %id, kind = ?body.kind, radius = blast.blast_radius, "exploded");
    ctx.events.push(SimEvent::Exploded {
        id,
        position: body.position,
    });
}
