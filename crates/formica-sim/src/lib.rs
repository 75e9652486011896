//! Simulation engine for Formica.
//!
//! Owns the hecs-backed entity store, runs systems once per tick in a fixed
//! order, and drives the pheromone worker.

pub mod actions;
pub mod context;
pub mod decide;
pub mod effects;
pub mod engine;
pub mod operations;
pub mod store;
pub mod systems;
pub mod world_setup;

pub use engine::{SimulationEngine, TickReport};
pub use formica_core as core;
