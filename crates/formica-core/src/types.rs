//! Fundamental identity, grid and timing types.

use std::fmt;
use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Stable integer identity of a simulation entity. Never reused.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owning side of an entity. Player 0 is the neutral world.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const NEUTRAL: PlayerId = PlayerId(0);
    pub const PLAYER: PlayerId = PlayerId(1);
    pub const ENEMY: PlayerId = PlayerId(2);
}

/// Discrete cell coordinate. The grid is y-down: larger `y` is lower on screen.
///
/// Serializes as the canonical `"x,y"` key so cell maps encode as JSON objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Canonical string key, e.g. `"3,-2"`.
    pub fn encode(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Parse a key produced by [`GridPos::encode`].
    pub fn decode(key: &str) -> Result<Self, SimError> {
        let invalid = || SimError::InvalidCellKey(key.to_string());
        let (x, y) = key.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
        let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The 4 orthogonal neighbours.
    pub fn orthogonal_neighbors(&self) -> [GridPos; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// The 8 orthogonal and diagonal neighbours.
    pub fn all_neighbors(&self) -> [GridPos; 8] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(-1, -1),
        ]
    }

    /// Round a continuous position to the nearest cell.
    pub fn round(pos: DVec2) -> Self {
        Self::new(pos.x.round() as i32, pos.y.round() as i32)
    }

    pub fn as_vec(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }

    /// Euclidean distance in cells.
    pub fn distance(&self, other: &GridPos) -> f64 {
        self.as_vec().distance(other.as_vec())
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for GridPos {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<GridPos> for String {
    fn from(pos: GridPos) -> Self {
        pos.encode()
    }
}

impl TryFrom<String> for GridPos {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

/// Rectangular extent of the simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Whether a `width` x `height` footprint anchored at `pos` lies fully inside.
    pub fn contains_footprint(&self, pos: GridPos, width: i32, height: i32) -> bool {
        self.contains(pos) && self.contains(pos.offset(width - 1, height - 1))
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number. The first tick run is tick 1.
    pub tick: u64,
    /// Total simulated milliseconds.
    pub elapsed_ms: f64,
    /// Milliseconds elapsed during the most recent tick.
    pub last_delta_ms: f64,
}

impl SimTime {
    /// Advance by one tick covering `delta_ms` of wall-clock time.
    pub fn advance(&mut self, delta_ms: f64) {
        let delta_ms = delta_ms.max(0.0);
        self.tick += 1;
        self.elapsed_ms += delta_ms;
        self.last_delta_ms = delta_ms;
    }
}

/// Angle of a vector in radians, `atan2(y, x)`.
pub fn vector_theta(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}

/// Vector of magnitude `magnitude` pointing along `theta`.
pub fn make_vector(theta: f64, magnitude: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin()) * magnitude
}

/// Whether two angles are within `CLOSE_TO_EPSILON` after normalizing `a`.
pub fn close_to(a: f64, b: f64) -> bool {
    let normalized = a % std::f64::consts::TAU;
    (normalized - b).abs() < crate::constants::CLOSE_TO_EPSILON
}
