//! Simulation engine: the tick scheduler.
//!
//! `SimulationEngine` owns the [`SimContext`], the link to the pheromone
//! worker and the command queue. Each call to [`SimulationEngine::advance`]
//! runs exactly one tick. It is headless and, with the inline worker,
//! fully deterministic for a given seed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use formica_core::commands::{HeldKeys, SimCommand};
use formica_core::components::Body;
use formica_core::config::SimConfig;
use formica_core::enums::{EntityKind, WorkerMode};
use formica_core::error::SimError;
use formica_core::events::SimEvent;
use formica_core::profiles::Registry;
use formica_core::state::SimSnapshot;
use formica_core::types::{EntityId, GridPos, PlayerId, SimTime};
use formica_pheromone::{PheromoneField, WorkerLink};

use crate::context::{PlayerState, SimContext};
use crate::operations;
use crate::store::EntityStore;
use crate::systems;
use crate::world_setup::{self, DemoWorld};

/// What one tick produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<SimEvent>,
}

/// The simulation engine. Owns all sim state.
pub struct SimulationEngine {
    ctx: SimContext,
    worker: WorkerLink,
    commands: VecDeque<SimCommand>,
    initialized: bool,
    worker_lost: bool,
}

impl SimulationEngine {
    /// Create an engine with the standard profile registry.
    ///
    /// If a threaded worker was requested but its thread cannot be started,
    /// propagation runs inline instead.
    pub fn new(config: SimConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::standard()))
    }

    pub fn with_registry(config: SimConfig, registry: Arc<Registry>) -> Self {
        let worker = match config.worker_mode {
            WorkerMode::Inline => WorkerLink::inline(Arc::clone(&registry)),
            WorkerMode::Threaded => {
                match WorkerLink::spawn(Arc::clone(&registry), config.worker_queue_capacity) {
                    Ok(link) => link,
                    Err(err) => {
                        tracing::warn!(%err, "falling back to inline pheromone worker");
                        WorkerLink::inline(Arc::clone(&registry))
                    }
                }
            }
        };
        tracing::debug!(
            seed = config.seed,
            width = config.grid_width,
            height = config.grid_height,
            threaded = worker.is_threaded(),
            "simulation engine created"
        );
        Self {
            ctx: SimContext::new(config, registry),
            worker,
            commands: VecDeque::new(),
            initialized: false,
            worker_lost: false,
        }
    }

    /// Populate the grid with the demo world.
    pub fn setup_demo(&mut self) -> Result<DemoWorld, SimError> {
        world_setup::setup_demo(&mut self.ctx)
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SimCommand) {
        self.commands.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SimCommand>) {
        self.commands.extend(commands);
    }

    /// Run one tick covering `elapsed_ms` of wall-clock time.
    pub fn advance(&mut self, elapsed_ms: f64) -> TickReport {
        self.process_commands();
        self.ctx.time.advance(elapsed_ms);

        if !self.initialized {
            match systems::pheromones::initialize(&mut self.ctx, &mut self.worker) {
                Ok(()) => self.initialized = true,
                Err(err) => tracing::warn!(%err, "pheromone worker init deferred"),
            }
        }

        self.run_systems();

        let events = std::mem::take(&mut self.ctx.events);
        if !events.is_empty() {
            tracing::trace!(tick = self.ctx.time.tick, events = events.len(), "tick complete");
        }
        TickReport {
            tick: self.ctx.time.tick,
            events,
        }
    }

    /// Run `ticks` ticks of `ms_per_tick` each, returning every event.
    pub fn run_ticks(&mut self, ticks: u64) -> Vec<SimEvent> {
        let dt = self.ctx.config.ms_per_tick as f64;
        (0..ticks).flat_map(|_| self.advance(dt).events).collect()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        systems::snapshot::build_snapshot(&self.ctx)
    }

    pub fn time(&self) -> SimTime {
        self.ctx.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.ctx.config
    }

    pub fn registry(&self) -> &Registry {
        &self.ctx.registry
    }

    pub fn store(&self) -> &EntityStore {
        &self.ctx.store
    }

    pub fn field(&self) -> &PheromoneField {
        &self.ctx.field
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &PlayerState)> {
        self.ctx.players.iter().map(|(id, player)| (*id, player))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        self.ctx.players.entry(id).or_default()
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn is_worker_threaded(&self) -> bool {
        self.worker.is_threaded()
    }

    pub fn set_controls(&mut self, keys: HeldKeys) {
        self.ctx.controls.keys = keys;
    }

    pub fn set_controlled_entity(&mut self, id: Option<EntityId>) {
        self.ctx.controls.controlled = id.filter(|id| self.ctx.store.contains(*id));
    }

    pub fn controlled_entity(&self) -> Option<EntityId> {
        self.ctx.controls.controlled
    }

    pub fn body(&self, id: EntityId) -> Option<Body> {
        self.ctx.store.body(id)
    }

    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        position: GridPos,
        owner: PlayerId,
    ) -> Result<EntityId, SimError> {
        operations::create_entity(&mut self.ctx, kind, position, owner)
    }

    /// Launch a projectile with its centre at `centre`.
    pub fn spawn_projectile(
        &mut self,
        kind: EntityKind,
        centre: DVec2,
        owner: PlayerId,
        theta: f64,
        target: Option<EntityId>,
    ) -> Result<EntityId, SimError> {
        operations::spawn_projectile(&mut self.ctx, kind, centre, owner, theta, target)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Result<Body, SimError> {
        operations::remove_entity(&mut self.ctx, id)
    }

    pub fn move_entity(&mut self, id: EntityId, position: GridPos) -> Result<(), SimError> {
        operations::move_entity(&mut self.ctx, id, position)
    }

    pub fn change_entity_type(&mut self, id: EntityId, kind: EntityKind) -> Result<(), SimError> {
        operations::change_entity_type(&mut self.ctx, id, kind)
    }

    pub fn add_segment_to_entity(&mut self, id: EntityId, position: GridPos) -> Result<(), SimError> {
        operations::add_segment_to_entity(&mut self.ctx, id, position)
    }

    pub fn change_emitter_quantity(&mut self, id: EntityId, quantity: f64) -> Result<(), SimError> {
        operations::change_emitter_quantity(&mut self.ctx, id, quantity)
    }

    pub fn set_jet_target(&mut self, id: EntityId, target: Option<EntityId>) -> Result<(), SimError> {
        operations::set_jet_target(&mut self.ctx, id, target)
    }

    pub fn deal_damage(&mut self, id: EntityId, amount: f64) {
        operations::deal_damage(&mut self.ctx, id, amount);
    }

    /// Wait for a threaded worker to post an update and merge it. Returns
    /// the number of changed cells (0 on timeout).
    pub fn flush_worker(&mut self, timeout: Duration) -> usize {
        match self.worker.recv_update_timeout(timeout) {
            Some(update) => {
                self.ctx.field.apply(&update);
                update.changes.len() + systems::pheromones::merge(&mut self.ctx, &mut self.worker)
            }
            None => 0,
        }
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            if let Err(err) = self.handle_command(command) {
                tracing::debug!(%err, "command rejected");
            }
        }
    }

    fn handle_command(&mut self, command: SimCommand) -> Result<(), SimError> {
        match command {
            SimCommand::SetControls { keys } => self.set_controls(keys),
            SimCommand::SetControlledEntity { id } => self.set_controlled_entity(id),
            SimCommand::SetJetTarget { id, target } => self.set_jet_target(id, target)?,
            SimCommand::CreateEntity {
                kind,
                position,
                owner,
            } => {
                self.create_entity(kind, position, owner)?;
            }
            SimCommand::RemoveEntity { id } => {
                self.remove_entity(id)?;
            }
            SimCommand::MoveEntity { id, position } => self.move_entity(id, position)?,
            SimCommand::ChangeEntityType { id, kind } => self.change_entity_type(id, kind)?,
            SimCommand::AddSegment { id, position } => self.add_segment_to_entity(id, position)?,
            SimCommand::ChangeEmitterQuantity { id, quantity } => {
                self.change_emitter_quantity(id, quantity)?
            }
        }
        Ok(())
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let ctx = &mut self.ctx;
        // 0. Results the worker posted since last tick
        systems::pheromones::merge(ctx, &mut self.worker);
        // 1. Jet physics
        systems::jets::run(ctx);
        // 2. Action stepping
        systems::actors::run(ctx);
        // 3. Agent bookkeeping and decisions
        systems::agents::run(ctx);
        // 4. Tile masks
        systems::tiles::run(ctx);
        // 5. Emitter refresh
        systems::emitters::run(ctx);
        // 6. Towers: target, aim, fire
        systems::towers::run(ctx);
        // 7. Ballistics: impacts, then trajectories
        systems::ballistics::run(ctx);
        // 8. Fire
        systems::flammables::run(ctx);
        // 9. Fuses
        systems::explosives::run(ctx);
        // 10. Expired deaths, then hand pheromone work to the worker
        systems::cleanup::run(ctx);
        systems::pheromones::dispatch(ctx, &mut self.worker, &mut self.worker_lost);
    }
}
