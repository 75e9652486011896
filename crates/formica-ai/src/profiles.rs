//! Per-kind behavior weights.

use formica_core::enums::EntityKind;

/// Weights used when an agent picks a wander step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderWeights {
    /// Weight every free neighbour starts with.
    pub base: f64,
    /// Added when the step continues the previous direction.
    pub forward_movement_bonus: f64,
    /// Added when the step returns to the previous position.
    pub prev_position_penalty: f64,
    /// Scales the normalized colony pheromone at the step.
    pub colony: f64,
    /// Scales the normalized light at the step.
    pub light: f64,
}

/// Behavioral profile of an agent kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentBehaviorProfile {
    pub wander: WanderWeights,
    /// Wander this long before heading home (ms).
    pub wander_duration_ms: f64,
    /// Keep fleeing this long once started (ms).
    pub flee_duration_ms: f64,
    pub fights: bool,
}

/// Get the behavioral profile for an agent kind.
pub fn get_profile(kind: EntityKind) -> AgentBehaviorProfile {
    use formica_core::constants::*;

    match kind {
        EntityKind::Sabre | EntityKind::Mig => AgentBehaviorProfile {
            wander: WanderWeights {
                base: 1.0,
                forward_movement_bonus: 0.0,
                prev_position_penalty: -100.0,
                colony: 10.0,
                light: 0.0,
            },
            wander_duration_ms: WANDER_TASK_MS,
            flee_duration_ms: FLEE_TASK_MS,
            fights: true,
        },
        _ => AgentBehaviorProfile {
            wander: WanderWeights {
                base: 1.0,
                forward_movement_bonus: 2.0,
                prev_position_penalty: -100.0,
                colony: 10.0,
                light: 1.0,
            },
            wander_duration_ms: WANDER_TASK_MS,
            flee_duration_ms: FLEE_TASK_MS,
            fights: true,
        },
    }
}
