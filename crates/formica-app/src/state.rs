//! State shared between the driver and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use formica_core::commands::SimCommand;
use formica_core::config::SimConfig;
use formica_core::state::SimSnapshot;

/// Commands sent from the driver to the game loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// A command to forward to the simulation engine.
    Command(SimCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// How the game loop thread builds and runs its engine.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub config: SimConfig,
    /// Populate the demo world before the first tick.
    pub demo: bool,
    /// Stop on its own after this many ticks.
    pub max_ticks: Option<u64>,
    /// Log a summary line every this many ticks (0 disables).
    pub report_every: u64,
}

impl LoopSettings {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            demo: true,
            max_ticks: None,
            report_every: 0,
        }
    }
}

/// What the game loop did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    /// Timer triggers dropped because a tick was still pending.
    pub dropped_triggers: u64,
    pub entities: usize,
}

/// Handle to a running game loop.
pub struct AppState {
    /// Channel sender to forward commands to the game loop thread.
    pub command_tx: mpsc::Sender<LoopCommand>,
    /// Latest snapshot, updated by the game loop thread after each tick.
    pub latest_snapshot: Arc<Mutex<Option<SimSnapshot>>>,
}

impl AppState {
    /// Forward a command. Returns false once the loop has stopped.
    pub fn send(&self, command: SimCommand) -> bool {
        self.command_tx.send(LoopCommand::Command(command)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    pub fn latest_tick(&self) -> Option<u64> {
        self.latest_snapshot
            .lock()
            .ok()
            .and_then(|lock| lock.as_ref().map(|snapshot| snapshot.time.tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_demo_without_limit() {
        let settings = LoopSettings::new(SimConfig::default());
        assert!(settings.demo);
        assert!(settings.max_ticks.is_none());
    }

    #[test]
    fn send_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::channel();
        let state = AppState {
            command_tx: tx,
            latest_snapshot: Arc::new(Mutex::new(None)),
        };
        assert!(state.latest_tick().is_none());
        assert!(state.send(SimCommand::SetControlledEntity { id: None }));
        drop(rx);
        assert!(!state.send(SimCommand::SetControlledEntity { id: None }));
    }
}
