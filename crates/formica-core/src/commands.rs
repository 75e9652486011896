//! Commands sent from a front end to the simulation.
//!
//! Commands are queued and applied at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;
use crate::types::{EntityId, GridPos, PlayerId};

/// Arrow keys currently held for the controlled jet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Discrete operations a front end may request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimCommand {
    // --- Control ---
    SetControls { keys: HeldKeys },
    SetControlledEntity { id: Option<EntityId> },
    SetJetTarget { id: EntityId, target: Option<EntityId> },

    // --- Entity operations ---
    CreateEntity {
        kind: EntityKind,
        position: GridPos,
        owner: PlayerId,
    },
    RemoveEntity { id: EntityId },
    MoveEntity { id: EntityId, position: GridPos },
    ChangeEntityType { id: EntityId, kind: EntityKind },
    AddSegment { id: EntityId, position: GridPos },
    ChangeEmitterQuantity { id: EntityId, quantity: f64 },
}
