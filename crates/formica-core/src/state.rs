//! Read model handed to the rendering collaborator after each tick.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{EntityId, GridPos, PlayerId, SimTime};

/// Complete simulation state as seen by a renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: SimTime,
    pub entities: Vec<EntityView>,
    pub pheromones: BTreeMap<PheromoneKind, BTreeMap<GridPos, f64>>,
    pub players: Vec<PlayerView>,
}

/// One entity, flattened for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PlayerId,
    pub position: GridPos,
    pub cont_pos: DVec2,
    pub width: i32,
    pub height: i32,
    pub hp: f64,
    pub action: Option<ActionKind>,
    pub prev_action: Option<ActionKind>,
    /// Barrel angle for towers, heading for jets and ballistics.
    pub theta: Option<f64>,
    pub tile_mask: u8,
    pub on_fire: bool,
    pub tower_phase: Option<TowerPhase>,
    pub task: Option<AgentTask>,
    pub segments: Vec<GridPos>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub resources: BTreeMap<Resource, u32>,
}
