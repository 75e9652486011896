//! Timed action queue: construction, queuing and per-tick stepping.

use formica_core::components::{Action, ActionPayload, ActionQueue};
use formica_core::enums::{ActionKind, EntityKind};
use formica_core::error::SimError;
use formica_core::profiles::Registry;
use formica_core::types::EntityId;

use crate::context::SimContext;
use crate::store::EntityStore;
use crate::{decide, effects};

/// Build an action from the kind's timing table. Kinds without an entry for
/// `action` cannot perform it.
pub fn make_action(
    registry: &Registry,
    kind: EntityKind,
    action: ActionKind,
    payload: ActionPayload,
) -> Option<Action> {
    let timing = registry.action_timing(kind, action)?;
    Some(Action {
        kind: action,
        duration: timing.duration,
        effect_index: timing.effect_index.min(timing.duration),
        effect_done: false,
        payload,
    })
}

/// Append an action and put the entity in the actor set.
pub fn queue_action(ctx: &mut SimContext, id: EntityId, action: Action) -> bool {
    let queued = ctx
        .store
        .with_mut::<ActionQueue, _>(id, |queue| queue.actions.push_back(action))
        .is_some();
    if queued {
        ctx.store.mark_actor(id);
    }
    queued
}

/// Build and queue in one step.
pub fn try_queue(
    ctx: &mut SimContext,
    id: EntityId,
    action: ActionKind,
    payload: ActionPayload,
) -> Result<(), SimError> {
    let kind = ctx.store.kind(id).ok_or(SimError::UnknownEntity(id))?;
    let built = make_action(&ctx.registry, kind, action, payload)
        .ok_or(SimError::MissingActionTiming { kind, action })?;
    if queue_action(ctx, id, built) {
        Ok(())
    } else {
        Err(SimError::MissingCapability {
            id,
            kind,
            capability: "action queue",
        })
    }
}

/// [`try_queue`] for systems: failures are logged and reported as false.
pub fn queue_new(ctx: &mut SimContext, id: EntityId, action: ActionKind, payload: ActionPayload) -> bool {
    match try_queue(ctx, id, action, payload) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(entity = %id, ?action, %err, "action not queued");
            false
        }
    }
}

/// Queue `Die` unless one is already queued.
pub fn queue_die(ctx: &mut SimContext, id: EntityId) -> bool {
    if is_action_queued(&ctx.store, id, ActionKind::Die) {
        return false;
    }
    queue_new(ctx, id, ActionKind::Die, ActionPayload::None)
}

pub fn is_action_queued(store: &EntityStore, id: EntityId, action: ActionKind) -> bool {
    store
        .get::<ActionQueue>(id)
        .is_some_and(|queue| queue.actions.iter().any(|a| a.kind == action))
}

pub fn head_action(store: &EntityStore, id: EntityId) -> Option<Action> {
    store
        .get::<ActionQueue>(id)
        .and_then(|queue| queue.actions.front().copied())
}

/// Advance an entity's head action by one tick.
///
/// 1. Once `total - remaining >= effect_index`, fire the effect (once).
/// 2. Otherwise, if nothing remains, pop it. An expired `Die` dooms the
///    entity; an emptied queue asks the entity to decide, and a new head
///    with a zero effect index fires immediately.
/// 3. Decrement the head's remaining duration, floored at zero.
pub fn step_action(ctx: &mut SimContext, id: EntityId) {
    if ctx.doomed.contains(&id) {
        return;
    }
    let Some(kind) = ctx.store.kind(id) else {
        return;
    };
    let Some(head) = head_action(&ctx.store, id) else {
        return;
    };
    let Some(timing) = ctx.registry.action_timing(kind, head.kind) else {
        tracing::debug!(entity = %id, ?kind, action = ?head.kind, "action without timing dropped");
        pop_head(ctx, id);
        return;
    };

    if timing.duration - head.duration >= head.effect_index && !head.effect_done {
        start_head(ctx, id);
    } else if head.duration <= 0.0 {
        pop_head(ctx, id);
        if head.kind == ActionKind::Die {
            ctx.doomed.push(id);
            return;
        }
        if head_action(&ctx.store, id).is_none() {
            decide::decide(ctx, id);
        }
        if head_action(&ctx.store, id).is_some_and(|next| next.effect_index == 0.0) {
            start_head(ctx, id);
        }
    }

    let dt = ctx.dt();
    ctx.store.with_mut::<ActionQueue, _>(id, |queue| {
        if let Some(current) = queue.actions.front_mut() {
            current.duration = (current.duration - dt).max(0.0);
        }
    });
}

fn pop_head(ctx: &mut SimContext, id: EntityId) {
    ctx.store.with_mut::<ActionQueue, _>(id, |queue| {
        if let Some(done) = queue.actions.pop_front() {
            queue.prev_action = Some(done.kind);
        }
    });
}

/// Mark the head's effect done and apply it.
fn start_head(ctx: &mut SimContext, id: EntityId) {
    let fired = ctx
        .store
        .with_mut::<ActionQueue, _>(id, |queue| {
            let head = queue.actions.front_mut()?;
            if head.effect_done {
                return None;
            }
            head.effect_done = true;
            Some(*head)
        })
        .flatten();
    if let Some(action) = fired {
        effects::apply(ctx, id, &action);
    }
}
