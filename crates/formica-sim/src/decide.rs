//! Decision callbacks: what an idle actor does next.

use formica_ai::fsm::{self, AgentContext, AgentIntent, NeighborCell};
use formica_core::components::{ActionPayload, AgentState, Body, Health};
use formica_core::enums::{ActionKind, DecisionPolicy, PheromoneKind, Tag};
use formica_core::types::{EntityId, GridPos, PlayerId};

use crate::actions;
use crate::context::SimContext;
use crate::operations;

/// Ask an actor with an empty queue for its next action.
pub fn decide(ctx: &mut SimContext, id: EntityId) {
    let Some(kind) = ctx.store.kind(id) else {
        return;
    };
    match ctx.registry.entity(kind).decision {
        DecisionPolicy::Fixed => {}
        DecisionPolicy::Jet => {
            actions::queue_new(ctx, id, ActionKind::Move, ActionPayload::None);
        }
        DecisionPolicy::Agent => decide_agent(ctx, id),
    }
}

fn decide_agent(ctx: &mut SimContext, id: EntityId) {
    let (Some(body), Some(health), Some(state)) = (
        ctx.store.body(id),
        ctx.store.get::<Health>(id),
        ctx.store.get::<AgentState>(id),
    ) else {
        return;
    };

    let neighbors: Vec<NeighborCell> = body
        .position
        .orthogonal_neighbors()
        .into_iter()
        .map(|pos| NeighborCell {
            pos,
            free: operations::is_free_for(ctx, id, pos),
            heat: ctx.field.get(PheromoneKind::Heat, pos),
            colony: ctx.field.get(PheromoneKind::Colony, pos),
            light: ctx.field.get(PheromoneKind::Light, pos),
        })
        .collect();

    let sensed = AgentContext {
        kind: body.kind,
        task: state.task,
        position: body.position,
        prev_position: state.prev_position,
        hp: health.hp,
        prev_hp: state.prev_hp,
        time_on_task_ms: state.time_on_task_ms,
        heat_here: ctx.field.get(PheromoneKind::Heat, body.position),
        colony_here: ctx.field.get(PheromoneKind::Colony, body.position),
        neighbors: &neighbors,
        enemy: adjacent_enemy(ctx, &body),
        can_shoot: ctx
            .registry
            .action_timing(body.kind, ActionKind::Shoot)
            .is_some(),
        max_colony: ctx.field.max_quantity(PheromoneKind::Colony),
        max_light: ctx.field.max_quantity(PheromoneKind::Light),
    };
    let decision = fsm::decide(&sensed, &mut ctx.rng);

    ctx.store.with_mut::<AgentState, _>(id, |agent| {
        if decision.task_changed {
            tracing::trace!(entity = %id, from = ?agent.task, to = ?decision.task, "agent task changed");
            agent.task = decision.task;
            agent.time_on_task_ms = 0.0;
        }
        agent.prev_hp = health.hp;
        agent.prev_hp_age_ms = 0.0;
        if matches!(decision.intent, AgentIntent::Move(_)) {
            agent.prev_position = Some(body.position);
        }
    });

    match decision.intent {
        AgentIntent::Idle => {}
        AgentIntent::Move(to) => {
            actions::queue_new(ctx, id, ActionKind::Move, ActionPayload::Move { to });
        }
        AgentIntent::Shoot { target, theta } => {
            let payload = ActionPayload::Shoot {
                theta,
                projectile: None,
                target: Some(target),
            };
            actions::queue_new(ctx, id, ActionKind::Shoot, payload);
        }
    }
}

/// Lowest-id living agent of another side next to `body`.
fn adjacent_enemy(ctx: &SimContext, body: &Body) -> Option<(EntityId, GridPos)> {
    let mut found: Option<(EntityId, GridPos)> = None;
    for pos in body.position.orthogonal_neighbors() {
        for other in ctx.store.occupants(pos) {
            if !ctx.store.has_tag(*other, Tag::Agent) {
                continue;
            }
            let Some(owner) = ctx.store.body(*other).map(|b| b.owner) else {
                continue;
            };
            if owner == body.owner || owner == PlayerId::NEUTRAL {
                continue;
            }
            if found.map_or(true, |(best, _)| *other < best) {
                found = Some((*other, pos));
            }
        }
    }
    found
}
