//! Propagation passes over a [`PheromoneField`].
//!
//! Steady-state kinds are flood filled from their sources: a breadth-first
//! walk over orthogonal neighbours that loses `decay_amount` per step. A cell
//! keeps the larger of its current and incoming value and only expands when
//! it improved. Dispersing kinds instead diffuse once per dispersion pass.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use formica_core::enums::PheromoneKind;
use formica_core::profiles::Registry;
use formica_core::types::{EntityId, GridPos};

use crate::field::PheromoneField;
use crate::terrain::Terrain;

/// One emitting cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PheromoneSource {
    pub kind: PheromoneKind,
    pub pos: GridPos,
    pub quantity: f64,
    /// Emitter entity the source belongs to, if any.
    pub emitter: Option<EntityId>,
}

impl PheromoneSource {
    pub fn new(kind: PheromoneKind, pos: GridPos, quantity: f64) -> Self {
        Self {
            kind,
            pos,
            quantity,
            emitter: None,
        }
    }

    pub fn from_emitter(mut self, id: EntityId) -> Self {
        self.emitter = Some(id);
        self
    }
}

/// Spread each source outward. Source cells are always written, even when
/// the source itself sits on a blocking cell.
pub fn flood_fill(
    field: &mut PheromoneField,
    terrain: &Terrain,
    registry: &Registry,
    sources: &[PheromoneSource],
) {
    let bounds = field.bounds();
    for source in sources {
        if !bounds.contains(source.pos) || source.quantity <= 0.0 {
            continue;
        }
        let profile = registry.pheromone(source.kind);
        let kind = source.kind;
        let start = source.quantity.min(field.max_quantity(kind));

        if profile.is_dispersing {
            let current = field.get(kind, source.pos);
            field.set(kind, source.pos, current.max(start));
            continue;
        }

        let mut queue = VecDeque::from([(source.pos, start)]);
        while let Some((cell, quantity)) = queue.pop_front() {
            if quantity <= field.get(kind, cell) {
                continue;
            }
            field.set(kind, cell, quantity);

            let next = quantity - profile.decay_amount;
            if next <= 0.0 {
                continue;
            }
            for neighbor in cell.orthogonal_neighbors() {
                if !bounds.contains(neighbor) || terrain.is_blocked(field, profile, neighbor) {
                    continue;
                }
                if next > field.get(kind, neighbor) {
                    queue.push_back((neighbor, next));
                }
            }
        }
    }
}

/// Recompute the steady-state layers of `kinds` from scratch after a source
/// weakened or disappeared. `sources` must list every remaining source of
/// those kinds. Dispersing kinds are left to fade on their own.
pub fn reverse_flood_fill(
    field: &mut PheromoneField,
    terrain: &Terrain,
    registry: &Registry,
    kinds: &[PheromoneKind],
    sources: &[PheromoneSource],
) {
    for kind in kinds {
        if !registry.pheromone(*kind).is_dispersing {
            field.clear(*kind);
        }
    }
    let relevant: Vec<PheromoneSource> = sources
        .iter()
        .filter(|s| kinds.contains(&s.kind))
        .copied()
        .collect();
    flood_fill(field, terrain, registry, &relevant);
}

/// Fill every steady-state kind from `sources`, as done once on the first tick.
pub fn compute_steady_state(
    field: &mut PheromoneField,
    terrain: &Terrain,
    registry: &Registry,
    sources: &[PheromoneSource],
) {
    let kinds: Vec<PheromoneKind> = registry
        .pheromones()
        .filter(|p| !p.is_dispersing)
        .map(|p| p.kind)
        .collect();
    reverse_flood_fill(field, terrain, registry, &kinds, sources);
}

/// One diffusion step for every dispersing kind.
///
/// Each cell becomes the larger of its own value minus `decay_rate` and the
/// best unblocked 8-neighbour minus `decay_amount`.
pub fn disperse(field: &mut PheromoneField, terrain: &Terrain, registry: &Registry) {
    let bounds = field.bounds();
    for profile in registry.pheromones().filter(|p| p.is_dispersing) {
        let kind = profile.kind;
        let decay_rate = profile.decay_rate.unwrap_or(profile.decay_amount);
        let current: Vec<(GridPos, f64)> = field.layer(kind).collect();

        let mut next: HashMap<GridPos, f64> = HashMap::with_capacity(current.len() * 2);
        let mut raise = |pos: GridPos, quantity: f64| {
            if quantity > 0.0 {
                let slot = next.entry(pos).or_insert(0.0);
                if quantity > *slot {
                    *slot = quantity;
                }
            }
        };

        for (cell, quantity) in current {
            raise(cell, quantity - decay_rate);
            let spread = quantity - profile.decay_amount;
            if spread <= 0.0 {
                continue;
            }
            for neighbor in cell.all_neighbors() {
                if bounds.contains(neighbor) && !terrain.is_blocked(field, profile, neighbor) {
                    raise(neighbor, spread);
                }
            }
        }

        field.replace_layer(kind, next);
    }
}
