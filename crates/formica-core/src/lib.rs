//! Core types and definitions for the Formica simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! ids and grid positions, components, per-kind profiles, snapshots,
//! events, errors and constants. It has no dependency on the ECS or
//! on any runtime framework.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod profiles;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
