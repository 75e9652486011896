//! Per-kind immutable profiles.
//!
//! `entity_profile` and `pheromone_profile` are the dispatch tables; the
//! [`Registry`] evaluates them once at startup and is shared (behind an
//! `Arc`) by the scheduler and the pheromone worker. Entity instances only
//! carry their `EntityKind`, which indexes into the registry.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::enums::*;

/// Total duration and effect threshold of one action type, in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionTiming {
    pub duration: f64,
    /// Elapsed ms after which the side effect fires. Never exceeds `duration`.
    pub effect_index: f64,
}

impl ActionTiming {
    pub const fn new(duration: f64) -> Self {
        Self {
            duration,
            effect_index: 0.0,
        }
    }

    pub const fn with_effect(duration: f64, effect_index: f64) -> Self {
        Self {
            duration,
            effect_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetProfile {
    pub mass: f64,
    pub drag_coefficient: f64,
    pub lift_coefficient: f64,
    pub thrust_rate: f64,
    pub start_thrust: f64,
    pub max_thrust: f64,
    /// Radians per tick.
    pub pitch_rate: f64,
    pub start_speed: f64,
    pub max_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerProfile {
    pub min_theta: f64,
    pub max_theta: f64,
    pub theta_accel: f64,
    pub max_theta_speed: f64,
    pub needs_cooldown: bool,
    pub shots_till_cooldown: u32,
    pub projectile: EntityKind,
    /// Resources drawn from the owner for every shot.
    pub launch_cost: BTreeMap<Resource, u32>,
    pub power_consumer: bool,
    /// Snap straight to the target angle instead of slewing.
    pub snaps_to_target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallisticProfile {
    pub speed: f64,
    pub damage: f64,
    pub miss_rate: Option<f64>,
    pub piercing: bool,
    /// Detonates within proximity of its designated target.
    pub warhead: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlammableProfile {
    pub combustion_temp: f64,
    /// Heat emitted once burning.
    pub heat_quantity: f64,
    pub fuel_ms: f64,
    pub can_ignite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterProfile {
    pub pheromone: PheromoneKind,
    pub quantity: f64,
    pub refresh_rate: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosiveProfile {
    pub timer_ms: Option<f64>,
    pub blast_radius: f64,
    pub damage: f64,
}

/// Immutable configuration of one entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProfile {
    pub kind: EntityKind,
    pub width: i32,
    pub height: i32,
    pub hp: f64,
    /// Melee damage for agents that shoot/bite.
    pub damage: f64,
    pub tags: Vec<Tag>,
    pub decision: DecisionPolicy,
    pub actions: BTreeMap<ActionKind, ActionTiming>,
    /// Kinds this entity collides with / cannot move into.
    pub blocking_types: Vec<EntityKind>,
    pub jet: Option<JetProfile>,
    pub tower: Option<TowerProfile>,
    pub ballistic: Option<BallisticProfile>,
    pub flammable: Option<FlammableProfile>,
    pub emitter: Option<EmitterProfile>,
    pub explosive: Option<ExplosiveProfile>,
}

impl EntityProfile {
    fn base(kind: EntityKind, width: i32, height: i32, hp: f64) -> Self {
        let mut actions = BTreeMap::new();
        actions.insert(ActionKind::Die, ActionTiming::new(1.0));
        Self {
            kind,
            width,
            height,
            hp,
            damage: 0.0,
            tags: Vec::new(),
            decision: DecisionPolicy::Fixed,
            actions,
            blocking_types: Vec::new(),
            jet: None,
            tower: None,
            ballistic: None,
            flammable: None,
            emitter: None,
            explosive: None,
        }
    }

    fn tags(mut self, tags: &[Tag]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    fn action(mut self, kind: ActionKind, timing: ActionTiming) -> Self {
        self.actions.insert(kind, timing);
        self
    }

    fn blocking(mut self, kinds: &[EntityKind]) -> Self {
        self.blocking_types = kinds.to_vec();
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Immutable configuration of one pheromone kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PheromoneProfile {
    pub kind: PheromoneKind,
    /// Upper bound of any cell's quantity; also the default emitter quantity.
    pub max_quantity: f64,
    /// Attenuation per propagation step.
    pub decay_amount: f64,
    /// Per-pass self decay of dispersing kinds (defaults to `decay_amount`).
    pub decay_rate: Option<f64>,
    pub blocking_types: Vec<EntityKind>,
    pub blocking_pheromones: Vec<PheromoneKind>,
    pub is_dispersing: bool,
}

const TERRAIN_BLOCKERS: [EntityKind; 9] = [
    EntityKind::Dirt,
    EntityKind::Stone,
    EntityKind::Doodad,
    EntityKind::Steel,
    EntityKind::Iron,
    EntityKind::BasicTurret,
    EntityKind::FastTurret,
    EntityKind::MissileTurret,
    EntityKind::LaserTurret,
];

const PROJECTILE_BLOCKERS: [EntityKind; 12] = [
    EntityKind::Dirt,
    EntityKind::Stone,
    EntityKind::Steel,
    EntityKind::Iron,
    EntityKind::Base,
    EntityKind::BasicTurret,
    EntityKind::FastTurret,
    EntityKind::MissileTurret,
    EntityKind::LaserTurret,
    EntityKind::Sabre,
    EntityKind::Mig,
    EntityKind::Missile,
];

/// Get the pheromone profile for a kind.
pub fn pheromone_profile(kind: PheromoneKind) -> PheromoneProfile {
    match kind {
        PheromoneKind::Light => PheromoneProfile {
            kind,
            max_quantity: 350.0,
            decay_amount: 1.0,
            decay_rate: None,
            blocking_types: TERRAIN_BLOCKERS.to_vec(),
            blocking_pheromones: Vec::new(),
            is_dispersing: false,
        },
        PheromoneKind::Heat => PheromoneProfile {
            kind,
            max_quantity: 150.0,
            decay_amount: 15.0,
            decay_rate: Some(1.0),
            blocking_types: TERRAIN_BLOCKERS.to_vec(),
            blocking_pheromones: Vec::new(),
            is_dispersing: true,
        },
        PheromoneKind::Colony => PheromoneProfile {
            kind,
            max_quantity: 300.0,
            decay_amount: 10.0,
            decay_rate: None,
            blocking_types: TERRAIN_BLOCKERS.to_vec(),
            blocking_pheromones: Vec::new(),
            is_dispersing: false,
        },
    }
}

/// Get the entity profile for a kind.
pub fn entity_profile(kind: EntityKind) -> EntityProfile {
    use ActionKind::*;
    use EntityKind as K;

    match kind {
        K::Background => EntityProfile::base(kind, 1, 1, 1.0),
        K::Doodad => EntityProfile::base(kind, 1, 1, 100.0),
        K::Dirt | K::Stone | K::Steel | K::Iron => {
            let hp = match kind {
                K::Dirt => 20.0,
                K::Stone => 100.0,
                _ => 200.0,
            };
            EntityProfile::base(kind, 1, 1, hp).tags(&[Tag::Tiled])
        }
        K::Coal => EntityProfile {
            flammable: Some(FlammableProfile {
                combustion_temp: 100.0,
                heat_quantity: 150.0,
                fuel_ms: 5_000.0,
                can_ignite: true,
            }),
            emitter: Some(EmitterProfile {
                pheromone: PheromoneKind::Heat,
                quantity: 0.0,
                refresh_rate: Some(6),
            }),
            ..EntityProfile::base(kind, 1, 1, 40.0)
                .tags(&[Tag::Tiled, Tag::Flammable, Tag::PheromoneEmitter])
        },
        K::Agent => EntityProfile {
            damage: 5.0,
            decision: DecisionPolicy::Agent,
            ..EntityProfile::base(kind, 1, 1, 10.0)
                .tags(&[Tag::Agent])
                .action(Move, ActionTiming::new(180.0))
                .action(Shoot, ActionTiming::with_effect(200.0, 100.0))
                .action(Die, ActionTiming::new(82.0))
                .blocking(&[
                    K::Dirt,
                    K::Stone,
                    K::Doodad,
                    K::Steel,
                    K::Iron,
                    K::Coal,
                    K::Agent,
                    K::Dynamite,
                    K::BasicTurret,
                    K::FastTurret,
                    K::MissileTurret,
                    K::LaserTurret,
                ])
        },
        K::Token => EntityProfile::base(kind, 1, 1, 1.0),
        K::Sun => EntityProfile {
            emitter: Some(EmitterProfile {
                pheromone: PheromoneKind::Light,
                quantity: 350.0,
                refresh_rate: Some(6),
            }),
            ..EntityProfile::base(kind, 1, 1, 1.0).tags(&[Tag::PheromoneEmitter])
        },
        K::Base => EntityProfile {
            emitter: Some(EmitterProfile {
                pheromone: PheromoneKind::Colony,
                quantity: 300.0,
                refresh_rate: None,
            }),
            ..EntityProfile::base(kind, 3, 3, 150.0)
                .tags(&[Tag::PheromoneEmitter])
                .action(Move, ActionTiming::new(10.0))
        },
        K::BasicTurret => EntityProfile {
            tower: Some(TowerProfile {
                min_theta: 0.2,
                max_theta: PI - 0.2,
                theta_accel: 0.0001,
                max_theta_speed: 0.03,
                needs_cooldown: false,
                shots_till_cooldown: 0,
                projectile: K::Bullet,
                launch_cost: BTreeMap::new(),
                power_consumer: false,
                snaps_to_target: false,
            }),
            ..EntityProfile::base(kind, 2, 2, 50.0)
                .tags(&[Tag::Tower])
                .action(Shoot, ActionTiming::new(300.0))
                .action(Die, ActionTiming::new(2.0))
        },
        K::FastTurret => EntityProfile {
            tower: Some(TowerProfile {
                min_theta: 0.2,
                max_theta: PI - 0.2,
                theta_accel: 0.0001,
                max_theta_speed: 0.05,
                needs_cooldown: true,
                shots_till_cooldown: 20,
                projectile: K::Bullet,
                launch_cost: BTreeMap::new(),
                power_consumer: false,
                snaps_to_target: false,
            }),
            ..EntityProfile::base(kind, 2, 2, 60.0)
                .tags(&[Tag::Tower])
                .action(Shoot, ActionTiming::new(60.0))
                .action(Cooldown, ActionTiming::new(1_000.0))
                .action(Die, ActionTiming::new(2.0))
        },
        K::MissileTurret => EntityProfile {
            tower: Some(TowerProfile {
                min_theta: 0.2,
                max_theta: PI - 0.2,
                theta_accel: 0.0,
                max_theta_speed: 0.0,
                needs_cooldown: false,
                shots_till_cooldown: 0,
                projectile: K::Missile,
                launch_cost: BTreeMap::from([(Resource::Steel, 2), (Resource::Sulphur, 1)]),
                power_consumer: false,
                snaps_to_target: true,
            }),
            ..EntityProfile::base(kind, 3, 3, 100.0)
                .tags(&[Tag::Tower])
                .action(Shoot, ActionTiming::new(500.0))
                .action(Die, ActionTiming::new(2.0))
        },
        K::LaserTurret => EntityProfile {
            damage: 10.0,
            tower: Some(TowerProfile {
                min_theta: 0.2,
                max_theta: PI - 0.2,
                theta_accel: 0.00005,
                max_theta_speed: 0.04,
                needs_cooldown: true,
                shots_till_cooldown: 40,
                projectile: K::Laser,
                launch_cost: BTreeMap::new(),
                power_consumer: true,
                snaps_to_target: false,
            }),
            ..EntityProfile::base(kind, 4, 4, 120.0)
                .tags(&[Tag::Tower])
                .action(Shoot, ActionTiming::new(1.0))
                .action(Cooldown, ActionTiming::new(1_800.0))
                .action(Die, ActionTiming::new(2.0))
        },
        K::Dynamite => EntityProfile {
            explosive: Some(ExplosiveProfile {
                timer_ms: Some(3_000.0),
                blast_radius: 5.0,
                damage: 100.0,
            }),
            ..EntityProfile::base(kind, 1, 1, 10.0)
                .tags(&[Tag::Explosive])
                .action(Die, ActionTiming::new(100.0))
        },
        K::Nuke => EntityProfile {
            explosive: Some(ExplosiveProfile {
                timer_ms: Some(6_000.0),
                blast_radius: 20.0,
                damage: 1_000.0,
            }),
            ..EntityProfile::base(kind, 2, 2, 50.0)
                .tags(&[Tag::Explosive])
                .action(Die, ActionTiming::new(300.0))
        },
        K::Missile => EntityProfile {
            ballistic: Some(BallisticProfile {
                speed: 800.0,
                damage: 50.0,
                miss_rate: None,
                piercing: false,
                warhead: true,
            }),
            ..EntityProfile::base(kind, 1, 1, 10.0)
                .tags(&[Tag::Ballistic, Tag::Missile])
                .blocking(&PROJECTILE_BLOCKERS)
        },
        K::Bullet => EntityProfile {
            ballistic: Some(BallisticProfile {
                speed: 1_500.0,
                damage: 10.0,
                miss_rate: Some(0.1),
                piercing: false,
                warhead: false,
            }),
            ..EntityProfile::base(kind, 1, 1, 1.0)
                .tags(&[Tag::Ballistic])
                .blocking(&PROJECTILE_BLOCKERS)
        },
        K::Laser => EntityProfile {
            ballistic: Some(BallisticProfile {
                speed: 3_000.0,
                damage: 10.0,
                miss_rate: None,
                piercing: true,
                warhead: false,
            }),
            ..EntityProfile::base(kind, 1, 1, 40.0)
                .tags(&[Tag::Ballistic])
                .blocking(&PROJECTILE_BLOCKERS)
        },
        K::Sabre | K::Mig => EntityProfile {
            damage: 20.0,
            decision: DecisionPolicy::Jet,
            jet: Some(JetProfile {
                mass: 5.0,
                drag_coefficient: 0.00001,
                lift_coefficient: 0.00015,
                thrust_rate: 1.0,
                start_thrust: 10.0,
                max_thrust: 50.0,
                pitch_rate: 0.025,
                start_speed: 10.0,
                max_speed: 50.0,
            }),
            ..EntityProfile::base(kind, 3, 3, 60.0)
                .tags(&[Tag::Jet])
                .action(Move, ActionTiming::new(180.0))
                .action(Flip, ActionTiming::with_effect(300.0, 299.0))
                .action(Shoot, ActionTiming::new(200.0))
                .action(Die, ActionTiming::new(82.0))
        },
    }
}

/// All profiles, evaluated once.
#[derive(Debug, Clone)]
pub struct Registry {
    entities: Vec<EntityProfile>,
    pheromones: BTreeMap<PheromoneKind, PheromoneProfile>,
}

impl Registry {
    /// Build the registry from the built-in dispatch tables.
    pub fn standard() -> Self {
        Self {
            entities: EntityKind::ALL.iter().map(|k| entity_profile(*k)).collect(),
            pheromones: PheromoneKind::ALL
                .iter()
                .map(|k| (*k, pheromone_profile(*k)))
                .collect(),
        }
    }

    pub fn entity(&self, kind: EntityKind) -> &EntityProfile {
        &self.entities[kind.index()]
    }

    pub fn pheromone(&self, kind: PheromoneKind) -> &PheromoneProfile {
        &self.pheromones[&kind]
    }

    pub fn pheromones(&self) -> impl Iterator<Item = &PheromoneProfile> {
        self.pheromones.values()
    }

    pub fn action_timing(&self, kind: EntityKind, action: ActionKind) -> Option<ActionTiming> {
        self.entity(kind).actions.get(&action).copied()
    }

    pub fn has_tag(&self, kind: EntityKind, tag: Tag) -> bool {
        self.entity(kind).has_tag(tag)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
