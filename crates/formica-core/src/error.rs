//! Error types shared by the simulation crates.

use thiserror::Error;

use crate::enums::{ActionKind, EntityKind};
use crate::types::{EntityId, GridPos};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("cell {0} is outside the grid")]
    OutOfBounds(GridPos),

    #[error("cell {pos} is blocked for {kind:?}")]
    Blocked { pos: GridPos, kind: EntityKind },

    #[error("{kind:?} has no timing for action {action:?}")]
    MissingActionTiming { kind: EntityKind, action: ActionKind },

    #[error("entity {id} ({kind:?}) lacks the {capability} capability")]
    MissingCapability {
        id: EntityId,
        kind: EntityKind,
        capability: &'static str,
    },

    #[error("invalid cell key {0:?}")]
    InvalidCellKey(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
