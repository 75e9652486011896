//! Ballistic impact resolution and closed-form trajectories.

use std::collections::BTreeSet;

use glam::DVec2;
use rand::Rng;

use formica_core::components::{BallisticState, Body, Health};
use formica_core::constants::{
    BALLISTIC_TIME_SCALE, MAX_TRAIL_POSITIONS, PIERCING_HP_DIVISOR, PROXIMITY_DETONATION_RADIUS,
};
use formica_core::enums::Tag;
use formica_core::events::SimEvent;
use formica_core::types::{vector_theta, EntityId, GridPos};

use crate::actions;
use crate::context::SimContext;
use crate::effects::centre;
use crate::operations;
use crate::store::footprint;

/// Position at `age_ms` after launch from `origin` at `theta` with `speed`.
///
/// `x = x0 + v t cos(theta)`, `y = y0 + v t sin(theta) - g t^2 / 2`, with
/// `t = age_ms / BALLISTIC_TIME_SCALE`.
pub fn trajectory(origin: DVec2, theta: f64, speed: f64, gravity: f64, age_ms: f64) -> DVec2 {
    let t = age_ms / BALLISTIC_TIME_SCALE;
    DVec2::new(
        origin.x + speed * t * theta.cos(),
        origin.y + speed * t * theta.sin() - 0.5 * gravity * t * t,
    )
}

pub fn run(ctx: &mut SimContext) {
    let dt = ctx.dt();
    let gravity = ctx.config.gravity;

    for id in ctx.store.tagged(Tag::Ballistic) {
        if operations::is_dying(ctx, id) {
            continue;
        }
        let (Some(body), Some(mut ballistic)) = (ctx.store.body(id), ctx.store.get::<BallisticState>(id))
        else {
            continue;
        };
        ballistic.age_ms += dt;

        // Impacts are resolved against the current position.
        let mut struck = collisions(ctx, id, &body);
        let near_target = proximity_hit(ctx, &body, &mut ballistic);
        if near_target {
            if let Some(target) = ballistic.target.filter(|t| !struck.contains(t)) {
                struck.push(target);
            }
        }

        if !struck.is_empty() || near_target {
            let missed = ballistic
                .miss_rate
                .is_some_and(|rate| ctx.rng.gen::<f64>() <= rate);
            if missed {
                ctx.events.push(SimEvent::Missed { ballistic: id });
            } else {
                ctx.store.insert_component(id, ballistic.clone());
                resolve_impact(ctx, id, &ballistic, struck);
                continue;
            }
        }

        // Advance along the parabola.
        let prev_centre = centre(&body);
        ballistic.trail.push(prev_centre);
        if ballistic.trail.len() > MAX_TRAIL_POSITIONS {
            ballistic.trail.remove(0);
        }
        let cont_pos = trajectory(
            ballistic.initial_position,
            ballistic.initial_theta,
            ballistic.speed,
            gravity,
            ballistic.age_ms,
        );
        let half = DVec2::new(body.width as f64, body.height as f64) / 2.0;
        ballistic.heading = vector_theta(cont_pos + half - prev_centre);
        ctx.store.insert_component(id, ballistic);
        ctx.store.with_mut::<Body, _>(id, |b| b.cont_pos = cont_pos);

        let cell = GridPos::round(cont_pos);
        if ctx
            .store
            .bounds()
            .contains_footprint(cell, body.width, body.height)
        {
            if let Err(err) = operations::move_entity(ctx, id, cell) {
                tracing::debug!(entity = %id, %err, "ballistic move failed");
            }
        } else {
            actions::queue_die(ctx, id);
        }
    }
}

/// Distinct entities of a blocking kind and another owner under the footprint.
fn collisions(ctx: &SimContext, id: EntityId, body: &Body) -> Vec<EntityId> {
    let blocking = &ctx.registry.entity(body.kind).blocking_types;
    let mut seen = BTreeSet::new();
    for cell in footprint(body, None) {
        for other in ctx.store.occupants(cell) {
            if *other == id || seen.contains(other) {
                continue;
            }
            let Some(other_body) = ctx.store.body(*other) else {
                continue;
            };
            if other_body.owner != body.owner && blocking.contains(&other_body.kind) {
                seen.insert(*other);
            }
        }
    }
    seen.into_iter().collect()
}

/// Whether a warhead is within detonation range of its target. Stale
/// targets are cleared.
fn proximity_hit(ctx: &SimContext, body: &Body, ballistic: &mut BallisticState) -> bool {
    let warhead = ctx
        .registry
        .entity(body.kind)
        .ballistic
        .as_ref()
        .is_some_and(|b| b.warhead);
    let Some(target) = ballistic.target else {
        return false;
    };
    match ctx.store.body(target) {
        Some(target_body) => {
            warhead && body.position.distance(&target_body.position) <= PROXIMITY_DETONATION_RADIUS
        }
        None => {
            ballistic.target = None;
            false
        }
    }
}

/// Damage every struck entity once, including a target caught by a
/// proximity detonation. Piercing rounds pay `defender_hp / 20`
/// of their own hit points per strike and survive while any remain.
fn resolve_impact(ctx: &mut SimContext, id: EntityId, ballistic: &BallisticState, struck: Vec<EntityId>) {
    for other in &struck {
        if ballistic.piercing {
            let defender_hp = ctx.store.get::<Health>(*other).map_or(0.0, |h| h.hp);
            ctx.store
                .with_mut::<Health, _>(id, |h| h.hp -= defender_hp / PIERCING_HP_DIVISOR);
        }
        operations::deal_damage(ctx, *other, ballistic.damage);
    }

    let own_hp = ctx.store.get::<Health>(id).map_or(0.0, |h| h.hp);
    if !ballistic.piercing || own_hp <= 0.0 {
        actions::queue_die(ctx, id);
    }
    ctx.events.push(SimEvent::Impact {
        ballistic: id,
        struck,
    });
}
