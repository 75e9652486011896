//! Game loop thread: runs the simulation engine off a fixed-period timer.
//!
//! The engine is created inside the loop thread, which owns it for its whole
//! life. Commands arrive via `mpsc` channel. A separate timer thread offers a
//! trigger every `ms_per_tick` over a rendezvous channel; a trigger offered
//! while the previous tick is still running is dropped, so ticks never queue
//! up behind a slow one.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use formica_core::state::SimSnapshot;
use formica_sim::SimulationEngine;

use crate::state::{AppState, LoopCommand, LoopSettings, LoopSummary};

/// Spawns the game loop in a new thread.
///
/// Returns the shared state for the driver and the loop's join handle.
pub fn spawn_game_loop(settings: LoopSettings) -> io::Result<(AppState, JoinHandle<LoopSummary>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let latest_snapshot = Arc::new(Mutex::new(None));
    let shared = Arc::clone(&latest_snapshot);

    let handle = std::thread::Builder::new()
        .name("formica-game-loop".into())
        .spawn(move || run_game_loop(settings, cmd_rx, &shared))?;

    Ok((
        AppState {
            command_tx: cmd_tx,
            latest_snapshot,
        },
        handle,
    ))
}

/// Offers a trigger every `period` until the loop side hangs up.
fn spawn_timer(
    period: Duration,
    trigger_tx: mpsc::SyncSender<()>,
    dropped: Arc<AtomicU64>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("formica-timer".into())
        .spawn(move || {
            let mut next_trigger = Instant::now() + period;
            loop {
                let now = Instant::now();
                if next_trigger > now {
                    std::thread::sleep(next_trigger - now);
                } else if now - next_trigger > period * 2 {
                    // Too far behind, reset instead of bursting
                    next_trigger = now;
                }
                next_trigger += period;

                match trigger_tx.try_send(()) {
                    Ok(()) => {}
                    Err(mpsc::TrySendError::Full(())) => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!("tick still pending, trigger dropped");
                    }
                    Err(mpsc::TrySendError::Disconnected(())) => return,
                }
            }
        })
}

/// The game loop. Runs until Shutdown, channel disconnect or `max_ticks`.
fn run_game_loop(
    settings: LoopSettings,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    latest_snapshot: &Mutex<Option<SimSnapshot>>,
) -> LoopSummary {
    let period = Duration::from_millis(settings.config.ms_per_tick.max(1));
    let mut engine = SimulationEngine::new(settings.config);
    if settings.demo {
        if let Err(err) = engine.setup_demo() {
            tracing::warn!(%err, "demo world incomplete");
        }
    }

    let dropped = Arc::new(AtomicU64::new(0));
    // Rendezvous: a send only succeeds while the loop is parked in `recv`.
    let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(0);
    let timer = match spawn_timer(period, trigger_tx, Arc::clone(&dropped)) {
        Ok(timer) => timer,
        Err(err) => {
            tracing::error!(%err, "failed to spawn tick timer");
            return LoopSummary::default();
        }
    };

    let mut ticks = 0;
    let mut last_tick = Instant::now();
    while trigger_rx.recv().is_ok() {
        // 1. Drain all pending commands
        if !drain_commands(&cmd_rx, &mut engine) {
            break;
        }

        // 2. Advance one tick by the wall-clock time since the last one
        let now = Instant::now();
        let elapsed_ms = (now - last_tick).as_secs_f64() * 1000.0;
        last_tick = now;
        let report = engine.advance(elapsed_ms);
        ticks += 1;

        // 3. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(engine.snapshot());
        }

        if settings.report_every > 0 && report.tick % settings.report_every == 0 {
            tracing::info!(
                tick = report.tick,
                entities = engine.store().len(),
                events = report.events.len(),
                dropped = dropped.load(Ordering::Relaxed),
                "tick"
            );
        }
        if settings.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
    }

    // Hanging up makes the timer's next offer fail.
    drop(trigger_rx);
    if timer.join().is_err() {
        tracing::warn!("tick timer panicked");
    }

    let summary = LoopSummary {
        ticks,
        dropped_triggers: dropped.load(Ordering::Relaxed),
        entities: engine.store().len(),
    };
    tracing::debug!(?summary, "game loop stopped");
    summary
}

/// Queue every pending command. Returns false when the loop should stop.
fn drain_commands(cmd_rx: &mpsc::Receiver<LoopCommand>, engine: &mut SimulationEngine) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(LoopCommand::Command(cmd)) => engine.queue_command(cmd),
            Ok(LoopCommand::Shutdown) => return false,
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        }
    }
}
