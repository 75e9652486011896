//! Entity operations: the only way entities are created, removed, moved or
//! retyped. Each keeps the tag index, occupancy grid and pheromone sources
//! consistent.

use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::sync::Arc;

use glam::DVec2;
use hecs::EntityBuilder;

use formica_core::components::*;
use formica_core::enums::{ActionKind, EntityKind, PheromoneKind, Tag};
use formica_core::error::SimError;
use formica_core::events::SimEvent;
use formica_core::profiles::{EntityProfile, Registry};
use formica_core::types::{make_vector, EntityId, GridPos, PlayerId};
use formica_pheromone::PheromoneSource;

use crate::actions;
use crate::context::SimContext;
use crate::store::footprint;

/// Heading new jets start with.
const JET_START_THETA: f64 = PI * 0.9;

/// Create an entity of `kind` with its top-left cell at `position`.
pub fn create_entity(
    ctx: &mut SimContext,
    kind: EntityKind,
    position: GridPos,
    owner: PlayerId,
) -> Result<EntityId, SimError> {
    let registry = Arc::clone(&ctx.registry);
    let profile = registry.entity(kind);
    if !ctx
        .store
        .bounds()
        .contains_footprint(position, profile.width, profile.height)
    {
        return Err(SimError::OutOfBounds(position));
    }

    let body = Body {
        id: EntityId::default(),
        kind,
        owner,
        position,
        cont_pos: position.as_vec(),
        prev_position: position,
        width: profile.width,
        height: profile.height,
        tile_mask: 0,
    };
    let mut builder = EntityBuilder::new();
    builder.add(Health {
        hp: profile.hp,
        max_hp: profile.hp,
    });
    builder.add(ActionQueue::default());
    add_capabilities(&mut builder, profile, &body);
    builder.add(body);

    let id = ctx
        .store
        .spawn(builder, &profile.tags)
        .ok_or(SimError::OutOfBounds(position))?;

    if let Some(emitter) = &profile.emitter {
        if emitter.quantity > 0.0 {
            assert_sources(ctx, id, emitter.pheromone, emitter.quantity);
            let sources = emitter_sources(ctx, id);
            ctx.pending.flood.extend(sources);
        }
    }
    if blocks_pheromones(&registry, kind) {
        ctx.pending.terrain_dirty = true;
    }

    tracing::trace!(entity = %id, ?kind, x = position.x, y = position.y, "entity created");
    ctx.events.push(SimEvent::EntitySpawned { id, kind });
    Ok(id)
}

/// Launch a projectile with its centre at `centre`.
pub fn spawn_projectile(
    ctx: &mut SimContext,
    kind: EntityKind,
    centre: DVec2,
    owner: PlayerId,
    theta: f64,
    target: Option<EntityId>,
) -> Result<EntityId, SimError> {
    let profile = ctx.registry.entity(kind);
    let half = DVec2::new(profile.width as f64, profile.height as f64) / 2.0;
    let cont_pos = centre - half;
    let id = create_entity(ctx, kind, GridPos::round(cont_pos), owner)?;
    ctx.store.with_mut::<Body, _>(id, |body| body.cont_pos = cont_pos);
    ctx.store.with_mut::<BallisticState, _>(id, |ballistic| {
        ballistic.initial_position = cont_pos;
        ballistic.initial_theta = theta;
        ballistic.heading = theta;
        ballistic.target = target;
    });
    Ok(id)
}

/// Remove an entity immediately.
pub fn remove_entity(ctx: &mut SimContext, id: EntityId) -> Result<Body, SimError> {
    let emitter = ctx.store.get::<EmitterState>(id);
    let body = ctx.store.despawn(id).ok_or(SimError::UnknownEntity(id))?;

    if let Some(emitter) = emitter {
        clear_sources(ctx, &body, emitter.pheromone);
        ctx.pending.reverse.insert(emitter.pheromone);
    }
    if blocks_pheromones(&ctx.registry, body.kind) {
        ctx.pending.terrain_dirty = true;
    }
    if ctx.controls.controlled == Some(id) {
        ctx.controls.controlled = None;
    }

    tracing::trace!(entity = %id, kind = ?body.kind, "entity removed");
    ctx.events.push(SimEvent::EntityRemoved { id, kind: body.kind });
    Ok(body)
}

/// Move an entity's footprint, updating occupancy and continuous position.
/// A continuous position that already rounds to `position` is kept.
pub fn move_entity(ctx: &mut SimContext, id: EntityId, position: GridPos) -> Result<(), SimError> {
    let body = ctx.store.body(id).ok_or(SimError::UnknownEntity(id))?;
    if !ctx
        .store
        .bounds()
        .contains_footprint(position, body.width, body.height)
    {
        return Err(SimError::OutOfBounds(position));
    }
    if body.position == position {
        return Ok(());
    }

    let emitter = ctx.store.get::<EmitterState>(id);
    if let Some(emitter) = &emitter {
        clear_sources(ctx, &body, emitter.pheromone);
    }

    ctx.store.relocate(id, position);
    ctx.store.with_mut::<Body, _>(id, |moved| {
        if GridPos::round(moved.cont_pos) != position {
            moved.cont_pos = position.as_vec();
        }
    });

    if let Some(emitter) = emitter {
        ctx.pending.reverse.insert(emitter.pheromone);
        if emitter.quantity > 0.0 {
            assert_sources(ctx, id, emitter.pheromone, emitter.quantity);
        }
    }
    if blocks_pheromones(&ctx.registry, body.kind) {
        ctx.pending.terrain_dirty = true;
    }
    Ok(())
}

/// Walk an entity to `position` if nothing there blocks it.
pub fn step_entity(ctx: &mut SimContext, id: EntityId, position: GridPos) -> Result<(), SimError> {
    let body = ctx.store.body(id).ok_or(SimError::UnknownEntity(id))?;
    if !ctx
        .store
        .bounds()
        .contains_footprint(position, body.width, body.height)
    {
        return Err(SimError::OutOfBounds(position));
    }
    if !is_free_for(ctx, id, position) {
        return Err(SimError::Blocked {
            pos: position,
            kind: body.kind,
        });
    }
    move_entity(ctx, id, position)
}

/// Change an entity's kind. Tags and capability components follow the new
/// kind's profile; hit points and queued actions are kept.
pub fn change_entity_type(ctx: &mut SimContext, id: EntityId, kind: EntityKind) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let body = ctx.store.body(id).ok_or(SimError::UnknownEntity(id))?;
    if body.kind == kind {
        return Ok(());
    }
    let old_profile = registry.entity(body.kind);
    let new_profile = registry.entity(kind);
    if !ctx
        .store
        .bounds()
        .contains_footprint(body.position, new_profile.width, new_profile.height)
    {
        return Err(SimError::OutOfBounds(body.position));
    }

    let old_emitter = ctx.store.get::<EmitterState>(id);
    if let Some(emitter) = &old_emitter {
        clear_sources(ctx, &body, emitter.pheromone);
        ctx.pending.reverse.insert(emitter.pheromone);
    }

    // Re-place the footprint under the new dimensions.
    ctx.store.retag(id, &old_profile.tags, &new_profile.tags);
    let body = ctx
        .store
        .reshape(id, kind, new_profile.width, new_profile.height);

    strip_capabilities(ctx, id);
    let mut builder = EntityBuilder::new();
    if let Some(body) = &body {
        add_capabilities(&mut builder, new_profile, body);
    }
    ctx.store.insert_bundle(id, &mut builder);
    ctx.store.with_mut::<Health, _>(id, |health| health.max_hp = new_profile.hp);

    if let Some(emitter) = &new_profile.emitter {
        if emitter.quantity > 0.0 {
            assert_sources(ctx, id, emitter.pheromone, emitter.quantity);
            let sources = emitter_sources(ctx, id);
            ctx.pending.flood.extend(sources);
        }
    }
    if blocks_pheromones(&registry, old_profile.kind) || blocks_pheromones(&registry, kind) {
        ctx.pending.terrain_dirty = true;
    }
    tracing::trace!(entity = %id, from = ?old_profile.kind, to = ?kind, "entity retyped");
    Ok(())
}

/// Attach a trailing body cell that occupies the grid.
pub fn add_segment_to_entity(ctx: &mut SimContext, id: EntityId, position: GridPos) -> Result<(), SimError> {
    if !ctx.store.bounds().contains(position) {
        return Err(SimError::OutOfBounds(position));
    }
    let kind = ctx.store.kind(id).ok_or(SimError::UnknownEntity(id))?;
    ctx.store.attach_segment(id, position);
    if blocks_pheromones(&ctx.registry, kind) {
        ctx.pending.terrain_dirty = true;
    }
    Ok(())
}

/// Set an emitter's quantity. Source cells change at once; an increase
/// (or a re-assert) queues a flood fill, a decrease queues a full
/// recompute of that pheromone kind.
pub fn change_emitter_quantity(ctx: &mut SimContext, id: EntityId, quantity: f64) -> Result<(), SimError> {
    let kind = ctx.store.kind(id).ok_or(SimError::UnknownEntity(id))?;
    let quantity = match ctx.store.get::<EmitterState>(id) {
        Some(emitter) => quantity.clamp(0.0, ctx.field.max_quantity(emitter.pheromone)),
        None => quantity.max(0.0),
    };
    let previous = ctx
        .store
        .with_mut::<EmitterState, _>(id, |emitter| {
            let previous = emitter.quantity;
            emitter.quantity = quantity;
            (previous, emitter.pheromone)
        })
        .ok_or(SimError::MissingCapability {
            id,
            kind,
            capability: "pheromone emitter",
        })?;
    let (previous, pheromone) = previous;

    assert_sources(ctx, id, pheromone, quantity);
    if quantity > 0.0 && quantity >= previous {
        let sources = emitter_sources(ctx, id);
        ctx.pending.flood.extend(sources);
    } else {
        ctx.pending.reverse.insert(pheromone);
    }
    Ok(())
}

/// Point an enemy jet at `target`, or back at the controlled jet with `None`.
pub fn set_jet_target(ctx: &mut SimContext, id: EntityId, target: Option<EntityId>) -> Result<(), SimError> {
    let kind = ctx.store.kind(id).ok_or(SimError::UnknownEntity(id))?;
    if let Some(target) = target.filter(|t| !ctx.store.contains(*t)) {
        return Err(SimError::UnknownEntity(target));
    }
    ctx.store
        .with_mut::<JetState, _>(id, |jet| jet.target = target)
        .ok_or(SimError::MissingCapability {
            id,
            kind,
            capability: "jet",
        })
}

/// Subtract hit points; an entity dropping to zero queues its death.
pub fn deal_damage(ctx: &mut SimContext, id: EntityId, amount: f64) {
    let remaining = ctx.store.with_mut::<Health, _>(id, |health| {
        health.hp -= amount;
        health.hp
    });
    if remaining.is_some_and(|hp| hp <= 0.0) {
        actions::queue_die(ctx, id);
    }
}

/// Source cells of one emitter at its current quantity.
pub fn emitter_sources(ctx: &SimContext, id: EntityId) -> Vec<PheromoneSource> {
    let Some(emitter) = ctx.store.get::<EmitterState>(id) else {
        return Vec::new();
    };
    let Some(body) = ctx.store.body(id) else {
        return Vec::new();
    };
    footprint(&body, None)
        .into_iter()
        .map(|pos| PheromoneSource::new(emitter.pheromone, pos, emitter.quantity).from_emitter(id))
        .collect()
}

/// Every active source of the given kinds.
pub fn all_sources(ctx: &SimContext, kinds: &BTreeSet<PheromoneKind>) -> Vec<PheromoneSource> {
    let mut sources = Vec::new();
    for id in ctx.store.tagged(Tag::PheromoneEmitter) {
        let Some(emitter) = ctx.store.get::<EmitterState>(id) else {
            continue;
        };
        if kinds.contains(&emitter.pheromone) && emitter.quantity > 0.0 {
            sources.extend(emitter_sources(ctx, id));
        }
    }
    sources
}

/// Whether entities of `kind` stop any pheromone from spreading.
pub fn blocks_pheromones(registry: &Registry, kind: EntityKind) -> bool {
    registry
        .pheromones()
        .any(|profile| profile.blocking_types.contains(&kind))
}

/// Whether `id` could stand with its top-left cell at `to`.
pub fn is_free_for(ctx: &SimContext, id: EntityId, to: GridPos) -> bool {
    let Some(body) = ctx.store.body(id) else {
        return false;
    };
    if !ctx
        .store
        .bounds()
        .contains_footprint(to, body.width, body.height)
    {
        return false;
    }
    let blocking = &ctx.registry.entity(body.kind).blocking_types;
    let probe = Body { position: to, ..body };
    footprint(&probe, None).into_iter().all(|cell| {
        ctx.store.occupants(cell).iter().all(|other| {
            *other == id
                || ctx
                    .store
                    .kind(*other)
                    .map_or(true, |kind| !blocking.contains(&kind))
        })
    })
}

fn assert_sources(ctx: &mut SimContext, id: EntityId, pheromone: PheromoneKind, quantity: f64) {
    let Some(body) = ctx.store.body(id) else {
        return;
    };
    for cell in footprint(&body, None) {
        ctx.field.set(pheromone, cell, quantity);
    }
}

fn add_capabilities(builder: &mut EntityBuilder, profile: &EntityProfile, body: &Body) {
    if let Some(jet) = &profile.jet {
        builder.add(JetState {
            velocity: make_vector(JET_START_THETA, jet.start_speed),
            theta: JET_START_THETA,
            thrust: jet.start_thrust,
            flipped: false,
            target: None,
            forces: JetForces::default(),
        });
    }
    if let Some(tower) = &profile.tower {
        builder.add(TowerState {
            theta: tower.min_theta,
            theta_speed: 0.0,
            theta_accel: 0.0,
            target: None,
            shots_since_cooldown: 0,
            projectile: tower.projectile,
            powered: !tower.power_consumer,
            phase: Default::default(),
        });
    }
    if let Some(ballistic) = &profile.ballistic {
        builder.add(BallisticState {
            age_ms: 0.0,
            initial_position: body.cont_pos,
            initial_theta: 0.0,
            speed: ballistic.speed,
            damage: ballistic.damage,
            target: None,
            miss_rate: ballistic.miss_rate,
            piercing: ballistic.piercing,
            heading: 0.0,
            trail: Vec::new(),
        });
    }
    if let Some(flammable) = &profile.flammable {
        builder.add(FlammableState {
            on_fire: false,
            fuel_ms: flammable.fuel_ms,
        });
    }
    if let Some(emitter) = &profile.emitter {
        builder.add(EmitterState {
            pheromone: emitter.pheromone,
            quantity: emitter.quantity,
            refresh_rate: emitter.refresh_rate,
        });
    }
    if let Some(explosive) = &profile.explosive {
        builder.add(ExplosiveState {
            age_ms: 0.0,
            timer_ms: explosive.timer_ms,
        });
    }
    if profile.has_tag(Tag::Agent) {
        builder.add(AgentState {
            age_ms: 0.0,
            task: Default::default(),
            time_on_task_ms: 0.0,
            prev_hp: profile.hp,
            prev_hp_age_ms: 0.0,
            prev_position: None,
        });
    }
}

fn strip_capabilities(ctx: &mut SimContext, id: EntityId) {
    ctx.store.remove_component::<JetState>(id);
    ctx.store.remove_component::<TowerState>(id);
    ctx.store.remove_component::<BallisticState>(id);
    ctx.store.remove_component::<FlammableState>(id);
    ctx.store.remove_component::<EmitterState>(id);
    ctx.store.remove_component::<ExplosiveState>(id);
    ctx.store.remove_component::<AgentState>(id);
}

/// Zero an emitter's source cells on the authoritative field.
fn clear_sources(ctx: &mut SimContext, body: &Body, pheromone: PheromoneKind) {
    for cell in footprint(body, None) {
        ctx.field.set(pheromone, cell, 0.0);
    }
}

/// Whether an entity's death is already scheduled.
pub fn is_dying(ctx: &SimContext, id: EntityId) -> bool {
    ctx.doomed.contains(&id) || actions::is_action_queued(&ctx.store, id, ActionKind::Die)
}
