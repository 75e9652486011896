//! Decision policies for Formica actors.
//!
//! Implements the agent task state machine, wander weighting and jet
//! steering. Everything here is plain data in, plain data out.

pub mod fsm;
pub mod jet;
pub mod profiles;

pub use formica_core as core;

#[cfg(test)]
mod tests;
