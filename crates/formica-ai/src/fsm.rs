//! Agent task state machine.
//!
//! Pure functions that pick an agent's task and next step from what it can
//! sense around it. No ECS dependency; the simulation gathers an
//! [`AgentContext`] and turns the returned [`AgentDecision`] into actions.

use rand::Rng;

use formica_core::enums::{AgentTask, EntityKind};
use formica_core::types::{vector_theta, EntityId, GridPos};

use crate::profiles::{get_profile, AgentBehaviorProfile, WanderWeights};

/// What an agent senses about one neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborCell {
    pub pos: GridPos,
    /// Whether the agent's footprint fits there without hitting a blocker.
    pub free: bool,
    pub heat: f64,
    pub colony: f64,
    pub light: f64,
}

/// Input to the agent FSM for a single entity.
#[derive(Debug, Clone)]
pub struct AgentContext<'a> {
    pub kind: EntityKind,
    pub task: AgentTask,
    pub position: GridPos,
    pub prev_position: Option<GridPos>,
    pub hp: f64,
    pub prev_hp: f64,
    pub time_on_task_ms: f64,
    pub heat_here: f64,
    pub colony_here: f64,
    pub neighbors: &'a [NeighborCell],
    /// Closest adjacent entity owned by another side.
    pub enemy: Option<(EntityId, GridPos)>,
    /// Whether the agent's kind can build a shoot action.
    pub can_shoot: bool,
    pub max_colony: f64,
    pub max_light: f64,
}

/// The step an agent wants to take next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentIntent {
    Idle,
    Move(GridPos),
    Shoot { target: EntityId, theta: f64 },
}

/// Output of the agent FSM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentDecision {
    pub task: AgentTask,
    pub intent: AgentIntent,
    pub task_changed: bool,
}

/// Evaluate the FSM for one agent.
pub fn decide<R: Rng + ?Sized>(ctx: &AgentContext<'_>, rng: &mut R) -> AgentDecision {
    let profile = get_profile(ctx.kind);
    let task = next_task(ctx, &profile);

    let intent = match task {
        AgentTask::Flee => flee_step(ctx),
        AgentTask::Fight => match ctx.enemy {
            Some((target, pos)) => AgentIntent::Shoot {
                target,
                theta: vector_theta(pos.as_vec() - ctx.position.as_vec()),
            },
            None => AgentIntent::Idle,
        },
        AgentTask::ReturnToColony => {
            climb_colony(ctx).unwrap_or_else(|| wander_step(ctx, &profile.wander, rng))
        }
        AgentTask::Wander => wander_step(ctx, &profile.wander, rng),
    };

    AgentDecision {
        task,
        intent,
        task_changed: task != ctx.task,
    }
}

/// Task transition table.
pub fn next_task(ctx: &AgentContext<'_>, profile: &AgentBehaviorProfile) -> AgentTask {
    let threatened = ctx.heat_here > 0.0 || ctx.hp < ctx.prev_hp;
    if threatened {
        return AgentTask::Flee;
    }

    let can_fight = profile.fights && ctx.can_shoot && ctx.enemy.is_some();

    match ctx.task {
        AgentTask::Flee if ctx.time_on_task_ms < profile.flee_duration_ms => AgentTask::Flee,
        _ if can_fight => AgentTask::Fight,
        AgentTask::Flee | AgentTask::Fight => AgentTask::Wander,
        AgentTask::Wander if ctx.time_on_task_ms >= profile.wander_duration_ms => {
            AgentTask::ReturnToColony
        }
        AgentTask::Wander => AgentTask::Wander,
        AgentTask::ReturnToColony => {
            let best_neighbor = ctx
                .neighbors
                .iter()
                .map(|n| n.colony)
                .fold(0.0_f64, f64::max);
            // At the peak of the colony gradient.
            if ctx.colony_here > 0.0 && ctx.colony_here >= best_neighbor {
                AgentTask::Wander
            } else {
                AgentTask::ReturnToColony
            }
        }
    }
}

/// Free neighbour with the least heat.
fn flee_step(ctx: &AgentContext<'_>) -> AgentIntent {
    ctx.neighbors
        .iter()
        .filter(|n| n.free)
        .min_by(|a, b| a.heat.total_cmp(&b.heat))
        .map_or(AgentIntent::Idle, |n| AgentIntent::Move(n.pos))
}

/// Free neighbour with strictly more colony pheromone than here.
fn climb_colony(ctx: &AgentContext<'_>) -> Option<AgentIntent> {
    ctx.neighbors
        .iter()
        .filter(|n| n.free && n.colony > ctx.colony_here)
        .max_by(|a, b| a.colony.total_cmp(&b.colony))
        .map(|n| AgentIntent::Move(n.pos))
}

/// Weight of stepping onto `cell`, never negative.
pub fn wander_weight(ctx: &AgentContext<'_>, weights: &WanderWeights, cell: &NeighborCell) -> f64 {
    let mut weight = weights.base;
    if ctx.max_colony > 0.0 {
        weight += weights.colony * cell.colony / ctx.max_colony;
    }
    if ctx.max_light > 0.0 {
        weight += weights.light * cell.light / ctx.max_light;
    }
    if let Some(prev) = ctx.prev_position {
        if cell.pos == prev {
            weight += weights.prev_position_penalty;
        }
        let forward = (ctx.position.x - prev.x, ctx.position.y - prev.y);
        let step = (cell.pos.x - ctx.position.x, cell.pos.y - ctx.position.y);
        if forward != (0, 0) && forward == step {
            weight += weights.forward_movement_bonus;
        }
    }
    weight.max(0.0)
}

fn wander_step<R: Rng + ?Sized>(
    ctx: &AgentContext<'_>,
    weights: &WanderWeights,
    rng: &mut R,
) -> AgentIntent {
    let free: Vec<&NeighborCell> = ctx.neighbors.iter().filter(|n| n.free).collect();
    if free.is_empty() {
        return AgentIntent::Idle;
    }

    let cell_weights: Vec<f64> = free
        .iter()
        .map(|cell| wander_weight(ctx, weights, cell))
        .collect();
    let total: f64 = cell_weights.iter().sum();
    if total <= 0.0 {
        let index = rng.gen_range(0..free.len());
        return AgentIntent::Move(free[index].pos);
    }

    let mut roll = rng.gen::<f64>() * total;
    for (cell, weight) in free.iter().zip(&cell_weights) {
        if roll < *weight {
            return AgentIntent::Move(cell.pos);
        }
        roll -= weight;
    }
    free.last()
        .map_or(AgentIntent::Idle, |cell| AgentIntent::Move(cell.pos))
}
