//! Jet aerodynamics.
//!
//! Drag, lift, thrust and weight are summed into an acceleration; velocity is
//! clamped to the jet's max speed and the continuous position advances one
//! unit along the velocity heading per tick.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;

use formica_ai::jet::JetControl;
use formica_core::components::{Body, JetForces, JetState};
use formica_core::enums::Tag;
use formica_core::profiles::JetProfile;
use formica_core::types::{make_vector, vector_theta, GridPos, PlayerId};

use crate::actions;
use crate::context::SimContext;
use crate::operations;

pub fn run(ctx: &mut SimContext) {
    for id in ctx.store.tagged(Tag::Jet) {
        let (Some(body), Some(mut jet)) = (ctx.store.body(id), ctx.store.get::<JetState>(id)) else {
            continue;
        };
        let Some(profile) = ctx.registry.entity(body.kind).jet.clone() else {
            continue;
        };

        let mut control = JetControl {
            theta: jet.theta,
            thrust: jet.thrust,
            flipped: jet.flipped,
            pitch_rate: profile.pitch_rate,
            thrust_rate: profile.thrust_rate,
            max_thrust: profile.max_thrust,
        };
        if ctx.controls.controlled == Some(id) {
            control = control.apply_keys(ctx.controls.keys);
        }
        if body.owner == PlayerId::ENEMY {
            let chased = jet
                .target
                .filter(|t| ctx.store.contains(*t))
                .or(ctx.controls.controlled)
                .and_then(|t| ctx.store.body(t));
            match chased {
                Some(target) => control = control.pursue(body.position, target.position),
                None => jet.target = None,
            }
        }
        let control = control.normalized();
        jet.theta = control.theta;
        jet.thrust = control.thrust;

        integrate(&mut jet, &profile);
        let heading = if jet.velocity == DVec2::ZERO {
            jet.theta
        } else {
            vector_theta(jet.velocity)
        };
        let cont_pos = body.cont_pos + make_vector(heading, 1.0);
        let cell = GridPos::round(cont_pos);

        ctx.store.insert_component(id, jet);
        ctx.store
            .with_mut::<Body, _>(id, |b| b.cont_pos = cont_pos);

        if ctx
            .store
            .bounds()
            .contains_footprint(cell, body.width, body.height)
        {
            if let Err(err) = operations::move_entity(ctx, id, cell) {
                tracing::debug!(entity = %id, %err, "jet move failed");
            }
        } else if actions::queue_die(ctx, id) {
            tracing::debug!(entity = %id, "jet left the grid");
        }
    }
}

/// One force update. Weight points down the y-down grid; drag opposes the
/// heading, thrust follows it and lift is perpendicular to it.
pub fn integrate(jet: &mut JetState, profile: &JetProfile) {
    let speed = jet.velocity.length();
    let drag = 0.5 * profile.drag_coefficient * speed * speed;
    let lift = 0.5 * profile.lift_coefficient * speed * speed * jet.theta.cos().abs();

    let forces = JetForces {
        drag: make_vector(jet.theta, -drag),
        lift: make_vector(jet.theta + FRAC_PI_2, lift),
        thrust: make_vector(jet.theta, jet.thrust),
        weight: DVec2::new(0.0, profile.mass),
        accel: DVec2::ZERO,
    };
    let accel = (forces.drag + forces.lift + forces.thrust + forces.weight) / profile.mass;

    jet.velocity = (jet.velocity + accel).clamp_length_max(profile.max_speed);
    jet.forces = JetForces { accel, ..forces };
}
