//! Runtime configuration for a simulation run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{Resource, WorkerMode};
use crate::error::SimError;
use crate::types::{GridBounds, PlayerId};

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Timer period of the driving loop (ms).
    pub ms_per_tick: u64,
    pub grid_width: i32,
    pub grid_height: i32,
    pub gravity: f64,
    /// Dispersing pheromones diffuse every this many ticks.
    pub dispersing_update_rate: u64,
    pub worker_mode: WorkerMode,
    /// Bound of the scheduler -> worker request queue.
    pub worker_queue_capacity: usize,
    /// When set, towers fire even if they consume power and are unpowered.
    pub pause_power_consumption: bool,
    /// Starting resource pools per player.
    pub starting_resources: BTreeMap<PlayerId, BTreeMap<Resource, u32>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let pool = BTreeMap::from([
            (Resource::Steel, 40),
            (Resource::Glass, 20),
            (Resource::Silicon, 10),
            (Resource::Sulphur, 20),
        ]);
        Self {
            seed: 42,
            ms_per_tick: MS_PER_TICK,
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            gravity: GRAVITY,
            dispersing_update_rate: DISPERSING_PHEROMONE_UPDATE_RATE,
            worker_mode: WorkerMode::default(),
            worker_queue_capacity: PHEROMONE_QUEUE_CAPACITY,
            pause_power_consumption: true,
            starting_resources: BTreeMap::from([
                (PlayerId::PLAYER, pool.clone()),
                (PlayerId::ENEMY, pool),
            ]),
        }
    }
}

impl SimConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_width, self.grid_height)
    }
}
