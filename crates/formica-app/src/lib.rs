//! Headless driver for the formica simulation.
//!
//! Runs the engine on its own thread off a fixed-period timer and exposes
//! a command channel plus the latest snapshot to whoever drives it.

pub mod game_loop;
pub mod state;

pub use formica_core as core;
