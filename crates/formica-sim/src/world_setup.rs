//! Entity factories for setting up a playable world.
//!
//! Everything goes through the entity operations, so tags, occupancy and
//! pheromone sources are consistent before the first tick.

use formica_core::enums::EntityKind;
use formica_core::error::SimError;
use formica_core::types::{EntityId, GridPos, PlayerId};

use crate::context::SimContext;
use crate::operations;

/// Rows of dirt at the bottom of the demo world.
const GROUND_DEPTH: i32 = 12;

/// Ids of the notable entities in the demo world.
#[derive(Debug, Clone, Default)]
pub struct DemoWorld {
    pub base: Option<EntityId>,
    pub sun: Option<EntityId>,
    pub agents: Vec<EntityId>,
    pub turrets: Vec<EntityId>,
    pub player_jet: Option<EntityId>,
    pub enemy_jet: Option<EntityId>,
    pub coal: Vec<EntityId>,
    pub dynamite: Option<EntityId>,
}

/// Ground with a colony dug into it, a sun overhead, agents for both sides,
/// turrets, a pair of jets and some fuel.
pub fn setup_demo(ctx: &mut SimContext) -> Result<DemoWorld, SimError> {
    let bounds = ctx.store.bounds();
    let surface = (bounds.height - GROUND_DEPTH).max(0);
    let mid = bounds.width / 2;
    let mut demo = DemoWorld::default();

    let colony = GridPos::new(mid - 1, surface + 3);
    spawn_ground(ctx, surface, colony)?;

    demo.base = Some(operations::create_entity(
        ctx,
        EntityKind::Base,
        colony,
        PlayerId::PLAYER,
    )?);
    demo.sun = Some(operations::create_entity(
        ctx,
        EntityKind::Sun,
        GridPos::new(mid, 2),
        PlayerId::NEUTRAL,
    )?);

    for i in 0..3 {
        let player = GridPos::new(mid - 4 + i, surface - 1);
        let enemy = GridPos::new(mid + 8 + i, surface - 1);
        demo.agents
            .push(operations::create_entity(ctx, EntityKind::Agent, player, PlayerId::PLAYER)?);
        demo.agents
            .push(operations::create_entity(ctx, EntityKind::Agent, enemy, PlayerId::ENEMY)?);
    }

    let turrets = [
        (EntityKind::BasicTurret, mid - 20, PlayerId::PLAYER),
        (EntityKind::MissileTurret, mid - 30, PlayerId::PLAYER),
        (EntityKind::FastTurret, mid + 20, PlayerId::ENEMY),
    ];
    for (kind, x, owner) in turrets {
        let height = ctx.registry.entity(kind).height;
        let position = GridPos::new(x, surface - height);
        demo.turrets
            .push(operations::create_entity(ctx, kind, position, owner)?);
    }

    let player_jet = operations::create_entity(
        ctx,
        EntityKind::Sabre,
        GridPos::new(mid - 10, surface / 3),
        PlayerId::PLAYER,
    )?;
    ctx.controls.controlled = Some(player_jet);
    demo.player_jet = Some(player_jet);
    let enemy_jet = operations::create_entity(
        ctx,
        EntityKind::Mig,
        GridPos::new(bounds.width - 10, surface / 4),
        PlayerId::ENEMY,
    )?;
    operations::set_jet_target(ctx, enemy_jet, Some(player_jet))?;
    demo.enemy_jet = Some(enemy_jet);

    for x in [mid + 30, mid + 31, mid + 32] {
        demo.coal.push(operations::create_entity(
            ctx,
            EntityKind::Coal,
            GridPos::new(x, surface - 1),
            PlayerId::NEUTRAL,
        )?);
    }
    demo.dynamite = Some(operations::create_entity(
        ctx,
        EntityKind::Dynamite,
        GridPos::new(mid + 29, surface - 1),
        PlayerId::NEUTRAL,
    )?);

    tracing::info!(
        entities = ctx.store.len(),
        agents = demo.agents.len(),
        turrets = demo.turrets.len(),
        "demo world ready"
    );
    Ok(demo)
}

/// Fill every row from `surface` down with dirt, leaving a chamber for the
/// colony base at `colony` and a shaft up to the surface.
pub fn spawn_ground(ctx: &mut SimContext, surface: i32, colony: GridPos) -> Result<usize, SimError> {
    let bounds = ctx.store.bounds();
    let base = ctx.registry.entity(EntityKind::Base);
    let (base_w, base_h) = (base.width, base.height);
    let in_chamber = |pos: GridPos| {
        pos.x >= colony.x - 1
            && pos.x <= colony.x + base_w
            && pos.y >= colony.y - 1
            && pos.y <= colony.y + base_h
    };
    let in_shaft = |pos: GridPos| pos.x == colony.x + base_w / 2 && pos.y < colony.y;

    let mut count = 0;
    for y in surface..bounds.height {
        for x in 0..bounds.width {
            let pos = GridPos::new(x, y);
            if in_chamber(pos) || in_shaft(pos) {
                continue;
            }
            operations::create_entity(ctx, EntityKind::Dirt, pos, PlayerId::NEUTRAL)?;
            count += 1;
        }
    }
    Ok(count)
}
