//! Pheromone fields for Formica.
//!
//! Per-kind quantity grids, the propagation passes that fill them
//! (flood fill, reverse flood fill, dispersion) and the background worker
//! that runs those passes off the tick thread.

pub use formica_core as core;

pub mod field;
pub mod propagation;
pub mod terrain;
pub mod worker;

pub use field::{CellChange, FieldUpdate, PheromoneField};
pub use propagation::PheromoneSource;
pub use terrain::Terrain;
pub use worker::{PheromoneWorker, WorkerError, WorkerLink, WorkerRequest};

#[cfg(test)]
mod tests;
