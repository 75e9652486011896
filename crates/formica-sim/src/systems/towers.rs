//! Tower targeting, aiming and firing.
//!
//! Phase progression: NoTarget -> Acquired -> Aiming -> Shoot, with Cooldown
//! interleaved for towers that overheat, and back to NoTarget when the
//! target disappears. The phase is recomputed every tick for observers.

use rand::seq::SliceRandom;

use formica_core::components::{ActionPayload, Body, TowerState};
use formica_core::enums::{ActionKind, Tag, TowerPhase};
use formica_core::events::SimEvent;
use formica_core::profiles::TowerProfile;
use formica_core::types::{close_to, EntityId, GridPos};

use crate::actions;
use crate::context::SimContext;

pub fn run(ctx: &mut SimContext) {
    for id in ctx.store.tagged(Tag::Tower) {
        let (Some(body), Some(mut tower)) = (ctx.store.body(id), ctx.store.get::<TowerState>(id)) else {
            continue;
        };
        let Some(profile) = ctx.registry.entity(body.kind).tower.clone() else {
            continue;
        };
        if profile.power_consumer && !tower.powered && !ctx.config.pause_power_consumption {
            continue;
        }

        if tower.target.is_none() {
            tower.target = acquire_target(ctx, &body);
        }

        let mut target_theta = profile.min_theta;
        if let Some(target) = tower.target {
            match ctx.store.body(target) {
                Some(target_body) => {
                    target_theta = aim_angle(&profile, body.position, target_body.position);
                }
                None => {
                    tracing::trace!(tower = %id, target = %target, "stale target cleared");
                    tower.target = None;
                }
            }
        }

        steer(&mut tower, &profile, target_theta);

        if tower.target.is_some() && !actions::is_action_queued(&ctx.store, id, ActionKind::Shoot) {
            fire(ctx, id, &body, &mut tower, &profile);
        }

        tower.phase = phase_of(ctx, id, &tower, target_theta);
        ctx.store.insert_component(id, tower);
    }
}

/// Uniform pick among missiles owned by another side.
fn acquire_target(ctx: &mut SimContext, body: &Body) -> Option<EntityId> {
    let candidates: Vec<EntityId> = ctx
        .store
        .tagged(Tag::Missile)
        .into_iter()
        .filter(|m| ctx.store.body(*m).is_some_and(|b| b.owner != body.owner))
        .collect();
    candidates.choose(&mut ctx.rng).copied()
}

/// Elevation from the tower to the target, clamped to the facing arc.
/// Targets level with or below the tower get `min_theta`.
pub fn aim_angle(profile: &TowerProfile, tower: GridPos, target: GridPos) -> f64 {
    if target.y >= tower.y {
        return profile.min_theta;
    }
    let rise = f64::from(tower.y - target.y);
    let run = f64::from(target.x - tower.x);
    rise.atan2(run).clamp(profile.min_theta, profile.max_theta)
}

/// Bounded proportional controller on the barrel angle.
pub fn steer(tower: &mut TowerState, profile: &TowerProfile, target_theta: f64) {
    if profile.snaps_to_target {
        tower.theta_accel = 0.0;
        tower.theta_speed = 0.0;
        tower.theta = target_theta.clamp(profile.min_theta, profile.max_theta);
        return;
    }

    if close_to(tower.theta, target_theta) {
        tower.theta_accel /= -2.0;
    } else if tower.theta < target_theta {
        tower.theta_accel = profile.theta_accel;
    } else {
        tower.theta_accel = -profile.theta_accel;
    }
    tower.theta_speed = (tower.theta_speed + tower.theta_accel)
        .clamp(-profile.max_theta_speed, profile.max_theta_speed);
    tower.theta += tower.theta_speed;

    let clamped = tower.theta.clamp(profile.min_theta, profile.max_theta);
    if !close_to(clamped, tower.theta) {
        tower.theta_speed = 0.0;
        tower.theta_accel = 0.0;
    }
    tower.theta = clamped;
}

fn fire(ctx: &mut SimContext, id: EntityId, body: &Body, tower: &mut TowerState, profile: &TowerProfile) {
    if profile.needs_cooldown {
        tower.shots_since_cooldown += 1;
        if tower.shots_since_cooldown > profile.shots_till_cooldown {
            tower.shots_since_cooldown = 0;
            if actions::queue_new(ctx, id, ActionKind::Cooldown, ActionPayload::None) {
                ctx.events.push(SimEvent::CooldownStarted { tower: id });
            }
        }
    }

    if !profile.launch_cost.is_empty() {
        let paid = ctx
            .players
            .get_mut(&body.owner)
            .is_some_and(|player| player.pay(&profile.launch_cost));
        if !paid {
            tracing::trace!(tower = %id, owner = body.owner.0, "launch cost not affordable");
            return;
        }
    }

    // Barrel elevation is measured upward; the grid is y-down.
    let payload = ActionPayload::Shoot {
        theta: -tower.theta,
        projectile: Some(tower.projectile),
        target: tower.target,
    };
    actions::queue_new(ctx, id, ActionKind::Shoot, payload);
}

fn phase_of(ctx: &SimContext, id: EntityId, tower: &TowerState, target_theta: f64) -> TowerPhase {
    if tower.target.is_none() {
        return TowerPhase::NoTarget;
    }
    match actions::head_action(&ctx.store, id).map(|a| a.kind) {
        Some(ActionKind::Cooldown) => TowerPhase::Cooldown,
        Some(ActionKind::Shoot) => TowerPhase::Shoot,
        _ if !close_to(tower.theta, target_theta) => TowerPhase::Aiming,
        _ => TowerPhase::Acquired,
    }
}
