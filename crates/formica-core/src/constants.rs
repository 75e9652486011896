//! Simulation constants and tuning parameters.

/// Nominal timer period between ticks (ms).
pub const MS_PER_TICK: u64 = 16;

/// Global gravity for ballistic trajectories. Negative: the grid is y-down.
pub const GRAVITY: f64 = -100.0;

/// Ballistic age (ms) is divided by this before entering the trajectory formula.
pub const BALLISTIC_TIME_SCALE: f64 = 10_000.0;

/// Distance (cells) at which a targeted ballistic detonates near its target.
pub const PROXIMITY_DETONATION_RADIUS: f64 = 4.0;

/// Piercing projectiles lose `defender_hp / PIERCING_HP_DIVISOR` per strike.
pub const PIERCING_HP_DIVISOR: f64 = 20.0;

/// Tolerance used when comparing angles.
pub const CLOSE_TO_EPSILON: f64 = 0.00001;

// --- Pheromones ---

/// Dispersing pheromones diffuse once every this many ticks.
pub const DISPERSING_PHEROMONE_UPDATE_RATE: u64 = 6;

/// Capacity of the request queue feeding the pheromone worker.
pub const PHEROMONE_QUEUE_CAPACITY: usize = 64;

// --- Grid ---

/// Default grid width (cells).
pub const GRID_WIDTH: i32 = 200;

/// Default grid height (cells).
pub const GRID_HEIGHT: i32 = 200;

// --- Agents ---

/// Time an agent wanders before it heads back to the colony (ms).
pub const WANDER_TASK_MS: f64 = 20_000.0;

/// Time an agent keeps fleeing once it has started (ms).
pub const FLEE_TASK_MS: f64 = 2_000.0;

/// Maximum length of a ballistic's recorded trail.
pub const MAX_TRAIL_POSITIONS: usize = 32;
