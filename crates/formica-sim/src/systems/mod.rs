//! Systems run by the scheduler each tick.
//!
//! Systems are plain functions over the [`SimContext`](crate::context::SimContext).
//! They do not own state; all state lives in components, the field and the
//! context. Tag sets are snapshotted at the start of a pass, except the
//! actor pass, which also visits actors added while it runs.

pub mod actors;
pub mod agents;
pub mod ballistics;
pub mod cleanup;
pub mod emitters;
pub mod explosives;
pub mod flammables;
pub mod jets;
pub mod pheromones;
pub mod snapshot;
pub mod tiles;
pub mod towers;
