//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Every type of entity the simulation knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Background,
    Doodad,
    Dirt,
    Stone,
    Steel,
    Iron,
    Coal,
    Agent,
    Token,
    Sun,
    Base,
    BasicTurret,
    FastTurret,
    MissileTurret,
    LaserTurret,
    Dynamite,
    Nuke,
    Missile,
    Bullet,
    Laser,
    Sabre,
    Mig,
}

impl EntityKind {
    pub const ALL: [EntityKind; 22] = [
        EntityKind::Background,
        EntityKind::Doodad,
        EntityKind::Dirt,
        EntityKind::Stone,
        EntityKind::Steel,
        EntityKind::Iron,
        EntityKind::Coal,
        EntityKind::Agent,
        EntityKind::Token,
        EntityKind::Sun,
        EntityKind::Base,
        EntityKind::BasicTurret,
        EntityKind::FastTurret,
        EntityKind::MissileTurret,
        EntityKind::LaserTurret,
        EntityKind::Dynamite,
        EntityKind::Nuke,
        EntityKind::Missile,
        EntityKind::Bullet,
        EntityKind::Laser,
        EntityKind::Sabre,
        EntityKind::Mig,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_turret(self) -> bool {
        matches!(
            self,
            EntityKind::BasicTurret
                | EntityKind::FastTurret
                | EntityKind::MissileTurret
                | EntityKind::LaserTurret
        )
    }
}

/// Timed behaviors an entity can queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Shoot,
    Die,
    Cooldown,
    Flip,
}

/// Capability / bookkeeping tags used to index entities by system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Entity has a non-empty action queue. Dynamic, removal is deferred.
    Actor,
    Agent,
    Jet,
    Tower,
    Ballistic,
    /// Ballistic-class entity towers may acquire as a target.
    Missile,
    Flammable,
    PheromoneEmitter,
    Explosive,
    /// Terrain drawn with neighbour-aware tiles.
    Tiled,
}

/// Scalar fields sensed by agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PheromoneKind {
    Light,
    Heat,
    Colony,
}

impl PheromoneKind {
    pub const ALL: [PheromoneKind; 3] =
        [PheromoneKind::Light, PheromoneKind::Heat, PheromoneKind::Colony];
}

/// High-level agent behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentTask {
    #[default]
    Wander,
    ReturnToColony,
    Flee,
    Fight,
}

/// Observable tower state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TowerPhase {
    #[default]
    NoTarget,
    Acquired,
    Aiming,
    Shoot,
    Cooldown,
}

/// How an idle actor chooses its next action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionPolicy {
    /// Static next-action table (usually: nothing).
    #[default]
    Fixed,
    /// Task-based agent behavior.
    Agent,
    /// Jets keep cycling their move animation.
    Jet,
}

/// Building and launch resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Steel,
    Glass,
    Silicon,
    Iron,
    Coal,
    Sulphur,
    Uranium,
}

/// Worker execution mode for pheromone propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerMode {
    /// Dedicated background thread.
    #[default]
    Threaded,
    /// Same worker logic run on the scheduler thread (deterministic).
    Inline,
}
