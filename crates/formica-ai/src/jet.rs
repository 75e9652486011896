//! Jet steering: player key control and enemy pursuit.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use formica_core::commands::HeldKeys;
use formica_core::types::{vector_theta, GridPos};

/// Steerable part of a jet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetControl {
    pub theta: f64,
    pub thrust: f64,
    pub flipped: bool,
    pub pitch_rate: f64,
    pub thrust_rate: f64,
    pub max_thrust: f64,
}

impl JetControl {
    /// Apply held keys. Up/down pitch, left/right change thrust; a flipped
    /// jet inverts both.
    pub fn apply_keys(mut self, keys: HeldKeys) -> Self {
        let flip = if self.flipped { -1.0 } else { 1.0 };
        if keys.up {
            self.theta += flip * self.pitch_rate;
        }
        if keys.down {
            self.theta -= flip * self.pitch_rate;
        }
        if keys.left {
            self.thrust = (self.thrust - flip * self.thrust_rate).clamp(0.0, self.max_thrust);
        }
        if keys.right {
            self.thrust = (self.thrust + flip * self.thrust_rate).clamp(0.0, self.max_thrust);
        }
        self
    }

    /// Pitch one step toward `target`, the way enemy jets chase the player.
    pub fn pursue(mut self, from: GridPos, target: GridPos) -> Self {
        let target_theta = vector_theta(target.as_vec() - from.as_vec()) % FRAC_PI_2;
        if target_theta > self.theta && target_theta - self.theta < PI {
            self.theta += self.pitch_rate;
        } else {
            self.theta -= self.pitch_rate;
        }
        self
    }

    pub fn normalized(mut self) -> Self {
        self.theta = normalize_theta(self.theta);
        self
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_theta(theta: f64) -> f64 {
    theta.rem_euclid(TAU)
}
