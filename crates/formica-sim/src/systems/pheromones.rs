//! Hand-off between the tick and the pheromone worker.
//!
//! Entity operations write source cells straight into the authoritative
//! field and leave propagation work in [`PendingPropagation`]. At the end of
//! a tick that work becomes worker requests; at the start of the next tick
//! whatever the worker has posted back is merged in.
//!
//! [`PendingPropagation`]: crate::context::PendingPropagation

use std::collections::{BTreeMap, BTreeSet};

use formica_core::components::EmitterState;
use formica_core::enums::{PheromoneKind, Tag};
use formica_pheromone::propagation;
use formica_pheromone::worker::{EmitterRecord, WorkerInit};
use formica_pheromone::{PheromoneSource, Terrain, WorkerError, WorkerLink, WorkerRequest};

use crate::context::SimContext;
use crate::operations;

/// Merge every update the worker has posted since the last tick.
pub fn merge(ctx: &mut SimContext, link: &mut WorkerLink) -> usize {
    let updates = link.drain_updates();
    let mut cells = 0;
    for update in &updates {
        cells += update.changes.len();
        ctx.field.apply(update);
    }
    if cells > 0 {
        tracing::trace!(updates = updates.len(), cells, "merged pheromone updates");
    }
    cells
}

/// First-tick bootstrap: compute the steady-state layers synchronously from
/// every existing emitter, then hand the worker its copy of the world.
pub fn initialize(ctx: &mut SimContext, link: &mut WorkerLink) -> Result<(), WorkerError> {
    let terrain = build_terrain(ctx);
    let kinds: BTreeSet<PheromoneKind> = PheromoneKind::ALL.into_iter().collect();
    let sources = operations::all_sources(ctx, &kinds);
    propagation::compute_steady_state(&mut ctx.field, &terrain, &ctx.registry, &sources);

    let mut emitters = BTreeMap::new();
    for id in ctx.store.tagged(Tag::PheromoneEmitter) {
        let Some(emitter) = ctx.store.get::<EmitterState>(id) else {
            continue;
        };
        if emitter.quantity > 0.0 {
            emitters.insert(
                id,
                EmitterRecord {
                    kind: emitter.pheromone,
                    quantity: emitter.quantity,
                    sources: operations::emitter_sources(ctx, id),
                },
            );
        }
    }

    tracing::info!(
        emitters = emitters.len(),
        sources = sources.len(),
        "pheromone field initialized"
    );
    link.send(WorkerRequest::Init(Box::new(WorkerInit {
        field: ctx.field.clone(),
        terrain,
        emitters,
    })))?;
    ctx.pending = Default::default();
    Ok(())
}

/// Turn this tick's pending work into worker requests, in order: terrain
/// sync, dispersion (every `dispersing_update_rate` ticks), reverse flood
/// fill, flood fill. Requests refused by a full queue stay pending, except
/// dispersion, which simply waits for its next turn.
pub fn dispatch(ctx: &mut SimContext, link: &mut WorkerLink, worker_lost: &mut bool) {
    if *worker_lost {
        ctx.pending = Default::default();
        return;
    }

    if ctx.pending.terrain_dirty {
        let terrain = build_terrain(ctx);
        match send(link, WorkerRequest::SyncTerrain(Box::new(terrain)), worker_lost) {
            Some(_) => {}
            None => {
                ctx.pending.terrain_dirty = false;
                // Blockers changed: every steady-state layer is recomputed.
                ctx.pending.reverse.extend(
                    ctx.registry
                        .pheromones()
                        .filter(|p| !p.is_dispersing)
                        .map(|p| p.kind),
                );
            }
        }
    }

    let rate = ctx.config.dispersing_update_rate.max(1);
    if ctx.time.tick % rate == 0
        && send(link, WorkerRequest::DispersePheromones, worker_lost).is_some()
    {
        tracing::debug!(tick = ctx.time.tick, "dispersion skipped, worker busy");
    }

    if !ctx.pending.reverse.is_empty() {
        let sources = operations::all_sources(ctx, &ctx.pending.reverse);
        let request = WorkerRequest::ReverseFloodFill {
            kinds: ctx.pending.reverse.iter().copied().collect(),
            sources,
        };
        if send(link, request, worker_lost).is_none() {
            ctx.pending.reverse.clear();
        } else {
            // The refill will pick up these sources anyway.
            let reverse = ctx.pending.reverse.clone();
            ctx.pending.flood.retain(|s| !reverse.contains(&s.kind));
        }
    }

    let flood = live_flood_sources(ctx);
    if !flood.is_empty() {
        if let Some(WorkerRequest::FloodFill(kept)) =
            send(link, WorkerRequest::FloodFill(flood), worker_lost)
        {
            ctx.pending.flood = kept;
        }
    }

    if *worker_lost {
        ctx.pending = Default::default();
    }
}

/// Pending flood sources whose emitter still exists and still emits.
fn live_flood_sources(ctx: &mut SimContext) -> Vec<PheromoneSource> {
    let pending = std::mem::take(&mut ctx.pending.flood);
    pending
        .into_iter()
        .filter(|source| match source.emitter {
            Some(id) => ctx
                .store
                .get::<EmitterState>(id)
                .is_some_and(|e| e.pheromone == source.kind && e.quantity > 0.0),
            None => true,
        })
        .collect()
}

/// Send one request. A request refused by a full queue is handed back; a
/// vanished worker is reported once and then ignored.
fn send(link: &mut WorkerLink, request: WorkerRequest, worker_lost: &mut bool) -> Option<WorkerRequest> {
    match link.send(request) {
        Ok(()) => None,
        Err(WorkerError::Full(request)) => Some(request),
        Err(err) => {
            if !*worker_lost {
                tracing::warn!(%err, "pheromone worker lost, propagation stopped");
            }
            *worker_lost = true;
            None
        }
    }
}

/// Terrain view of the grid: every occupied cell and the kinds standing there.
pub fn build_terrain(ctx: &SimContext) -> Terrain {
    let mut terrain = Terrain::new(ctx.store.bounds());
    for (pos, occupants) in ctx.store.occupied_cells() {
        for id in occupants {
            if let Some(kind) = ctx.store.kind(*id) {
                terrain.insert(pos, kind);
            }
        }
    }
    terrain
}
