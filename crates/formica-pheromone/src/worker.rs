//! Background pheromone worker.
//!
//! The worker owns its own copy of the field and terrain, set once by
//! [`WorkerRequest::Init`]. Requests arrive over a bounded channel; each
//! processed request posts back a [`FieldUpdate`] listing the cells that
//! changed, which the scheduler merges into the authoritative field on its
//! next tick.

use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use formica_core::enums::PheromoneKind;
use formica_core::profiles::Registry;
use formica_core::types::EntityId;

use crate::field::{FieldUpdate, PheromoneField};
use crate::propagation::{self, PheromoneSource};
use crate::terrain::Terrain;

/// Emitter table entry handed to the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterRecord {
    pub kind: PheromoneKind,
    pub quantity: f64,
    pub sources: Vec<PheromoneSource>,
}

/// Bootstrap payload: the full grid, the terrain and the emitter table.
#[derive(Debug, Clone)]
pub struct WorkerInit {
    pub field: PheromoneField,
    pub terrain: Terrain,
    pub emitters: BTreeMap<EntityId, EmitterRecord>,
}

/// Messages from the scheduler to the worker.
#[derive(Debug, Clone)]
pub enum WorkerRequest {
    Init(Box<WorkerInit>),
    /// One decay and diffusion pass over the dispersing kinds.
    DispersePheromones,
    /// Newly active or strengthened sources.
    FloodFill(Vec<PheromoneSource>),
    /// Recompute `kinds` from every listed source.
    ReverseFloodFill {
        kinds: Vec<PheromoneKind>,
        sources: Vec<PheromoneSource>,
    },
    /// Replace the worker's terrain after blocking entities changed.
    SyncTerrain(Box<Terrain>),
    Shutdown,
}

impl WorkerRequest {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerRequest::Init(_) => "init",
            WorkerRequest::DispersePheromones => "disperse_pheromones",
            WorkerRequest::FloodFill(_) => "flood_fill",
            WorkerRequest::ReverseFloodFill { .. } => "reverse_flood_fill",
            WorkerRequest::SyncTerrain(_) => "sync_terrain",
            WorkerRequest::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The request queue is at capacity; the request is handed back.
    #[error("pheromone worker queue is full ({} pending)", .0.name())]
    Full(WorkerRequest),
    #[error("pheromone worker has stopped")]
    Disconnected,
    #[error("failed to spawn pheromone worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

struct WorkerState {
    field: PheromoneField,
    terrain: Terrain,
    emitters: BTreeMap<EntityId, EmitterRecord>,
}

/// Request handling, independent of how requests are delivered.
pub struct PheromoneWorker {
    registry: Arc<Registry>,
    state: Option<WorkerState>,
}

impl PheromoneWorker {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            state: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn field(&self) -> Option<&PheromoneField> {
        self.state.as_ref().map(|s| &s.field)
    }

    /// Process one request. Returns the changed cells, if any.
    pub fn handle(&mut self, request: WorkerRequest) -> Option<FieldUpdate> {
        let registry = Arc::clone(&self.registry);

        let request = match request {
            WorkerRequest::Init(init) => {
                let WorkerInit {
                    field,
                    terrain,
                    emitters,
                } = *init;
                tracing::debug!(emitters = emitters.len(), "pheromone worker initialized");
                self.state = Some(WorkerState {
                    field,
                    terrain,
                    emitters,
                });
                return None;
            }
            other => other,
        };

        let Some(state) = self.state.as_mut() else {
            tracing::debug!(request = request.name(), "pheromone request before init dropped");
            return None;
        };

        match request {
            WorkerRequest::Init(_) | WorkerRequest::Shutdown => None,
            WorkerRequest::SyncTerrain(terrain) => {
                state.terrain = *terrain;
                None
            }
            WorkerRequest::DispersePheromones => {
                let kinds: Vec<PheromoneKind> = registry
                    .pheromones()
                    .filter(|p| p.is_dispersing)
                    .map(|p| p.kind)
                    .collect();
                let before = state.field.clone();
                propagation::disperse(&mut state.field, &state.terrain, &registry);
                // Active dispersing emitters hold their source cells.
                let held: Vec<PheromoneSource> = state
                    .emitters
                    .values()
                    .filter(|e| kinds.contains(&e.kind) && e.quantity > 0.0)
                    .flat_map(|e| e.sources.iter().copied())
                    .collect();
                propagation::flood_fill(&mut state.field, &state.terrain, &registry, &held);
                Some(state.field.diff(&before, &kinds))
            }
            WorkerRequest::FloodFill(sources) => {
                record_sources(&mut state.emitters, &sources);
                let kinds = kinds_of(&sources);
                let before = state.field.clone();
                propagation::flood_fill(&mut state.field, &state.terrain, &registry, &sources);
                Some(state.field.diff(&before, &kinds))
            }
            WorkerRequest::ReverseFloodFill { kinds, sources } => {
                state
                    .emitters
                    .retain(|_, record| !kinds.contains(&record.kind));
                record_sources(&mut state.emitters, &sources);
                let before = state.field.clone();
                propagation::reverse_flood_fill(
                    &mut state.field,
                    &state.terrain,
                    &registry,
                    &kinds,
                    &sources,
                );
                Some(state.field.diff(&before, &kinds))
            }
        }
    }
}

fn kinds_of(sources: &[PheromoneSource]) -> Vec<PheromoneKind> {
    let mut kinds: Vec<PheromoneKind> = sources.iter().map(|s| s.kind).collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

fn record_sources(emitters: &mut BTreeMap<EntityId, EmitterRecord>, sources: &[PheromoneSource]) {
    let mut fresh: BTreeMap<EntityId, EmitterRecord> = BTreeMap::new();
    for source in sources {
        let Some(id) = source.emitter else { continue };
        let record = fresh.entry(id).or_insert_with(|| EmitterRecord {
            kind: source.kind,
            quantity: source.quantity,
            sources: Vec::new(),
        });
        record.sources.push(*source);
    }
    emitters.extend(fresh);
}

enum Transport {
    Threaded {
        requests: Option<SyncSender<WorkerRequest>>,
        updates: Receiver<FieldUpdate>,
        thread: Option<JoinHandle<()>>,
    },
    Inline {
        worker: Box<PheromoneWorker>,
        posted: VecDeque<FieldUpdate>,
    },
}

/// Scheduler-side handle to the worker.
///
/// Sending never blocks. Updates produced by a request are only visible
/// through [`WorkerLink::drain_updates`], so in both modes results reach
/// the authoritative field no earlier than the following tick.
pub struct WorkerLink {
    transport: Transport,
}

impl WorkerLink {
    /// Start the worker on its own thread with a request queue of `capacity`.
    pub fn spawn(registry: Arc<Registry>, capacity: usize) -> Result<Self, WorkerError> {
        let (request_tx, request_rx) = mpsc::sync_channel::<WorkerRequest>(capacity.max(1));
        let (update_tx, update_rx) = mpsc::channel::<FieldUpdate>();

        let thread = std::thread::Builder::new()
            .name("pheromone-worker".into())
            .spawn(move || {
                let mut worker = PheromoneWorker::new(registry);
                while let Ok(request) = request_rx.recv() {
                    if matches!(request, WorkerRequest::Shutdown) {
                        break;
                    }
                    if let Some(update) = worker.handle(request) {
                        if update.is_empty() {
                            continue;
                        }
                        if update_tx.send(update).is_err() {
                            break;
                        }
                    }
                }
                tracing::debug!("pheromone worker stopped");
            })?;

        Ok(Self {
            transport: Transport::Threaded {
                requests: Some(request_tx),
                updates: update_rx,
                thread: Some(thread),
            },
        })
    }

    /// Run the worker logic on the calling thread.
    pub fn inline(registry: Arc<Registry>) -> Self {
        Self {
            transport: Transport::Inline {
                worker: Box::new(PheromoneWorker::new(registry)),
                posted: VecDeque::new(),
            },
        }
    }

    pub fn is_threaded(&self) -> bool {
        matches!(self.transport, Transport::Threaded { .. })
    }

    /// Queue a request without blocking.
    pub fn send(&mut self, request: WorkerRequest) -> Result<(), WorkerError> {
        match &mut self.transport {
            Transport::Threaded { requests, .. } => {
                let Some(sender) = requests.as_ref() else {
                    return Err(WorkerError::Disconnected);
                };
                sender.try_send(request).map_err(|err| match err {
                    TrySendError::Full(request) => WorkerError::Full(request),
                    TrySendError::Disconnected(_) => WorkerError::Disconnected,
                })
            }
            Transport::Inline { worker, posted } => {
                if let Some(update) = worker.handle(request) {
                    if !update.is_empty() {
                        posted.push_back(update);
                    }
                }
                Ok(())
            }
        }
    }

    /// Take every update posted so far.
    pub fn drain_updates(&mut self) -> Vec<FieldUpdate> {
        match &mut self.transport {
            Transport::Threaded { updates, .. } => {
                let mut drained = Vec::new();
                loop {
                    match updates.try_recv() {
                        Ok(update) => drained.push(update),
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                    }
                }
                drained
            }
            Transport::Inline { posted, .. } => posted.drain(..).collect(),
        }
    }

    /// Wait for the next update from a threaded worker.
    pub fn recv_update_timeout(&mut self, timeout: std::time::Duration) -> Option<FieldUpdate> {
        match &mut self.transport {
            Transport::Threaded { updates, .. } => updates.recv_timeout(timeout).ok(),
            Transport::Inline { posted, .. } => posted.pop_front(),
        }
    }
}

impl Drop for WorkerLink {
    fn drop(&mut self) {
        if let Transport::Threaded {
            requests, thread, ..
        } = &mut self.transport
        {
            if let Some(sender) = requests.take() {
                let _ = sender.try_send(WorkerRequest::Shutdown);
            }
            if let Some(handle) = thread.take() {
                if handle.join().is_err() {
                    tracing::warn!("pheromone worker panicked");
                }
            }
        }
    }
}
