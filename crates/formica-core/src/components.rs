//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in systems, not components.

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{EntityId, GridPos, PlayerId};

/// Identity, footprint and placement. Every entity has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PlayerId,
    /// Top-left cell of the footprint.
    pub position: GridPos,
    /// Sub-cell position used by physics.
    pub cont_pos: DVec2,
    pub prev_position: GridPos,
    pub width: i32,
    pub height: i32,
    /// 4-neighbour same-kind mask for tiled terrain (bit 0 = left, 1 = up, 2 = right, 3 = down).
    pub tile_mask: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub hp: f64,
    pub max_hp: f64,
}

/// Action-specific parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ActionPayload {
    #[default]
    None,
    Move {
        to: GridPos,
    },
    /// `theta` is the launch angle in grid space. Without a projectile the
    /// shooter strikes `target` directly.
    Shoot {
        theta: f64,
        projectile: Option<EntityKind>,
        target: Option<EntityId>,
    },
}

/// One queued, timed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Remaining duration (ms).
    pub duration: f64,
    /// Elapsed duration (ms) at which the side effect fires.
    pub effect_index: f64,
    pub effect_done: bool,
    pub payload: ActionPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    pub actions: VecDeque<Action>,
    /// Type of the most recently completed action (for animation lookups).
    pub prev_action: Option<ActionKind>,
}

/// Forces from the last aerodynamic update, kept for force-vector overlays.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JetForces {
    pub drag: DVec2,
    pub lift: DVec2,
    pub thrust: DVec2,
    pub weight: DVec2,
    pub accel: DVec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetState {
    pub velocity: DVec2,
    /// Heading (radians).
    pub theta: f64,
    pub thrust: f64,
    pub flipped: bool,
    /// Entity enemy jets steer toward (defaults to the controlled entity).
    pub target: Option<EntityId>,
    pub forces: JetForces,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallisticState {
    /// Time since launch (ms).
    pub age_ms: f64,
    pub initial_position: DVec2,
    pub initial_theta: f64,
    pub speed: f64,
    pub damage: f64,
    pub target: Option<EntityId>,
    /// Probability an otherwise qualifying impact is skipped.
    pub miss_rate: Option<f64>,
    pub piercing: bool,
    /// Heading derived from the last two centre positions.
    pub heading: f64,
    /// Recent centre positions, oldest first.
    pub trail: Vec<DVec2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerState {
    pub theta: f64,
    pub theta_speed: f64,
    pub theta_accel: f64,
    pub target: Option<EntityId>,
    pub shots_since_cooldown: u32,
    pub projectile: EntityKind,
    pub powered: bool,
    pub phase: TowerPhase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlammableState {
    pub on_fire: bool,
    /// Remaining burn time (ms).
    pub fuel_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmitterState {
    pub pheromone: PheromoneKind,
    pub quantity: f64,
    /// Re-assert every `refresh_rate` ticks, staggered by id.
    pub refresh_rate: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExplosiveState {
    pub age_ms: f64,
    /// Fuse length; `None` detonates immediately.
    pub timer_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub age_ms: f64,
    pub task: AgentTask,
    pub time_on_task_ms: f64,
    /// Hit points at the last health check.
    pub prev_hp: f64,
    pub prev_hp_age_ms: f64,
    pub prev_position: Option<GridPos>,
}

/// Extra trailing cells attached to an entity's body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segments {
    pub cells: Vec<GridPos>,
}
