//! PheromoneField: per-kind cell quantities with clamped writes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use formica_core::enums::PheromoneKind;
use formica_core::profiles::Registry;
use formica_core::types::{GridBounds, GridPos};

/// One cell's new quantity for one kind. Zero means the cell was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    pub kind: PheromoneKind,
    pub pos: GridPos,
    pub quantity: f64,
}

/// Changes posted back by the worker, applied to the authoritative field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub changes: Vec<CellChange>,
}

impl FieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Quantity grid for every pheromone kind.
///
/// Every write goes through [`PheromoneField::set`], which clamps to
/// `[0, max_quantity]` and drops zero cells, so stored quantities are
/// always within bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PheromoneField {
    bounds: GridBounds,
    maxima: BTreeMap<PheromoneKind, f64>,
    layers: BTreeMap<PheromoneKind, HashMap<GridPos, f64>>,
}

impl PheromoneField {
    pub fn new(bounds: GridBounds, registry: &Registry) -> Self {
        let maxima = registry
            .pheromones()
            .map(|p| (p.kind, p.max_quantity))
            .collect();
        let layers = registry
            .pheromones()
            .map(|p| (p.kind, HashMap::new()))
            .collect();
        Self {
            bounds,
            maxima,
            layers,
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn max_quantity(&self, kind: PheromoneKind) -> f64 {
        self.maxima.get(&kind).copied().unwrap_or(0.0)
    }

    /// Quantity at a cell; missing cells read as zero.
    pub fn get(&self, kind: PheromoneKind, pos: GridPos) -> f64 {
        self.layers
            .get(&kind)
            .and_then(|layer| layer.get(&pos))
            .copied()
            .unwrap_or(0.0)
    }

    /// Write a quantity, clamped to `[0, max]`. Out-of-bounds cells are ignored.
    pub fn set(&mut self, kind: PheromoneKind, pos: GridPos, quantity: f64) {
        if !self.bounds.contains(pos) {
            return;
        }
        let max = self.max_quantity(kind);
        let quantity = if quantity.is_nan() {
            0.0
        } else {
            quantity.clamp(0.0, max)
        };
        let layer = self.layers.entry(kind).or_default();
        if quantity > 0.0 {
            layer.insert(pos, quantity);
        } else {
            layer.remove(&pos);
        }
    }

    pub fn clear(&mut self, kind: PheromoneKind) {
        if let Some(layer) = self.layers.get_mut(&kind) {
            layer.clear();
        }
    }

    /// Non-zero cells of one kind.
    pub fn layer(&self, kind: PheromoneKind) -> impl Iterator<Item = (GridPos, f64)> + '_ {
        self.layers
            .get(&kind)
            .into_iter()
            .flat_map(|layer| layer.iter().map(|(pos, q)| (*pos, *q)))
    }

    /// Replace one kind's layer wholesale (values still clamped).
    pub fn replace_layer(&mut self, kind: PheromoneKind, cells: HashMap<GridPos, f64>) {
        self.clear(kind);
        for (pos, quantity) in cells {
            self.set(kind, pos, quantity);
        }
    }

    pub fn apply(&mut self, update: &FieldUpdate) {
        for change in &update.changes {
            self.set(change.kind, change.pos, change.quantity);
        }
    }

    /// Cells of `kinds` whose value differs from `before`.
    pub fn diff(&self, before: &PheromoneField, kinds: &[PheromoneKind]) -> FieldUpdate {
        let mut changes = Vec::new();
        for kind in kinds {
            for (pos, quantity) in self.layer(*kind) {
                if before.get(*kind, pos) != quantity {
                    changes.push(CellChange {
                        kind: *kind,
                        pos,
                        quantity,
                    });
                }
            }
            for (pos, _) in before.layer(*kind) {
                if self.get(*kind, pos) == 0.0 {
                    changes.push(CellChange {
                        kind: *kind,
                        pos,
                        quantity: 0.0,
                    });
                }
            }
        }
        changes.sort_by_key(|c| (c.kind, c.pos));
        FieldUpdate { changes }
    }

    /// Ordered copy for snapshots.
    pub fn to_view(&self) -> BTreeMap<PheromoneKind, BTreeMap<GridPos, f64>> {
        self.layers
            .iter()
            .map(|(kind, layer)| (*kind, layer.iter().map(|(p, q)| (*p, *q)).collect()))
            .collect()
    }

    pub fn cell_count(&self, kind: PheromoneKind) -> usize {
        self.layers.get(&kind).map_or(0, |layer| layer.len())
    }
}
