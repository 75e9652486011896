//! Events emitted by the simulation for renderer, audio and log feedback.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{EntityId, GridPos};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    EntitySpawned {
        id: EntityId,
        kind: EntityKind,
    },
    EntityRemoved {
        id: EntityId,
        kind: EntityKind,
    },
    /// An emitter re-asserted its quantity on its staggered schedule.
    EmitterRefreshed {
        id: EntityId,
        pheromone: PheromoneKind,
        tick: u64,
    },
    TowerFired {
        tower: EntityId,
        projectile: EntityKind,
        theta: f64,
    },
    CooldownStarted {
        tower: EntityId,
    },
    /// A ballistic struck one or more entities (or detonated near its target).
    Impact {
        ballistic: EntityId,
        struck: Vec<EntityId>,
    },
    /// A qualifying impact was skipped by the miss roll.
    Missed {
        ballistic: EntityId,
    },
    Ignited {
        id: EntityId,
    },
    Exploded {
        id: EntityId,
        position: GridPos,
    },
}
