//! Terrain: which entity kinds occupy each cell, as seen by propagation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use formica_core::enums::EntityKind;
use formica_core::profiles::PheromoneProfile;
use formica_core::types::{GridBounds, GridPos};

use crate::field::PheromoneField;

/// Occupancy snapshot used to decide where pheromones may spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    bounds: GridBounds,
    occupants: HashMap<GridPos, Vec<EntityKind>>,
}

impl Terrain {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bounds,
            occupants: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn insert(&mut self, pos: GridPos, kind: EntityKind) {
        self.occupants.entry(pos).or_default().push(kind);
    }

    pub fn kinds_at(&self, pos: GridPos) -> &[EntityKind] {
        self.occupants.get(&pos).map_or(&[], |kinds| kinds.as_slice())
    }

    /// Whether `pos` stops propagation of the profile's kind, by terrain or by
    /// a blocking pheromone already present there.
    pub fn is_blocked(&self, field: &PheromoneField, profile: &PheromoneProfile, pos: GridPos) -> bool {
        if self
            .kinds_at(pos)
            .iter()
            .any(|kind| profile.blocking_types.contains(kind))
        {
            return true;
        }
        profile
            .blocking_pheromones
            .iter()
            .any(|other| field.get(*other, pos) > 0.0)
    }
}
