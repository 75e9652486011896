//! The simulation context every system receives.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use formica_core::commands::HeldKeys;
use formica_core::config::SimConfig;
use formica_core::enums::{PheromoneKind, Resource};
use formica_core::events::SimEvent;
use formica_core::profiles::Registry;
use formica_core::types::{EntityId, PlayerId, SimTime};
use formica_pheromone::{PheromoneField, PheromoneSource};

use crate::store::EntityStore;

/// A player's resource pool.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub resources: BTreeMap<Resource, u32>,
}

impl PlayerState {
    pub fn can_afford(&self, cost: &BTreeMap<Resource, u32>) -> bool {
        cost.iter()
            .all(|(resource, amount)| self.resources.get(resource).copied().unwrap_or(0) >= *amount)
    }

    /// Deduct `cost` if affordable. Returns whether it was paid.
    pub fn pay(&mut self, cost: &BTreeMap<Resource, u32>) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (resource, amount) in cost {
            if let Some(held) = self.resources.get_mut(resource) {
                *held -= amount;
            }
        }
        true
    }
}

/// Pheromone work waiting to be handed to the worker at the end of a tick.
#[derive(Debug, Default, Clone)]
pub struct PendingPropagation {
    pub flood: Vec<PheromoneSource>,
    pub reverse: BTreeSet<PheromoneKind>,
    /// Blocking terrain changed since the worker last saw it.
    pub terrain_dirty: bool,
}

impl PendingPropagation {
    pub fn is_empty(&self) -> bool {
        self.flood.is_empty() && self.reverse.is_empty() && !self.terrain_dirty
    }
}

/// Held-key state and the jet it applies to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controls {
    pub keys: HeldKeys,
    pub controlled: Option<EntityId>,
}

/// All mutable simulation state, owned by the engine and passed to systems.
pub struct SimContext {
    pub config: SimConfig,
    pub registry: Arc<Registry>,
    pub store: EntityStore,
    pub field: PheromoneField,
    pub pending: PendingPropagation,
    pub players: BTreeMap<PlayerId, PlayerState>,
    pub rng: ChaCha8Rng,
    pub time: SimTime,
    pub controls: Controls,
    pub events: Vec<SimEvent>,
    /// Entities whose terminal action expired this tick.
    pub doomed: Vec<EntityId>,
}

impl SimContext {
    pub fn new(config: SimConfig, registry: Arc<Registry>) -> Self {
        let bounds = config.bounds();
        let players = config
            .starting_resources
            .iter()
            .map(|(id, pool)| {
                (
                    *id,
                    PlayerState {
                        resources: pool.clone(),
                    },
                )
            })
            .collect();
        Self {
            store: EntityStore::new(bounds),
            field: PheromoneField::new(bounds, &registry),
            pending: PendingPropagation::default(),
            players,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time: SimTime::default(),
            controls: Controls::default(),
            events: Vec::new(),
            doomed: Vec::new(),
            registry,
            config,
        }
    }

    /// Milliseconds covered by the current tick.
    pub fn dt(&self) -> f64 {
        self.time.last_delta_ms
    }
}
