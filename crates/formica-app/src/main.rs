use std::path::PathBuf;

use formica_app::game_loop::spawn_game_loop;
use formica_app::state::LoopSettings;
use formica_core::config::SimConfig;
use formica_core::error::SimError;

/// Ticks between progress lines.
const REPORT_EVERY: u64 = 100;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("usage: formica [CONFIG.json] [TICKS]")]
    Usage,
    #[error("invalid tick count `{0}`")]
    Ticks(String),
    #[error("failed to load config: {0}")]
    Config(#[from] SimError),
    #[error("failed to start game loop: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("game loop panicked")]
    Panicked,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    if let Err(err) = run() {
        tracing::error!(%err, "formica exited with an error");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(PathBuf::from(path))?,
        None => SimConfig::default(),
    };
    let max_ticks = args
        .next()
        .map(|arg| arg.parse::<u64>().map_err(|_| AppError::Ticks(arg)))
        .transpose()?;
    if args.next().is_some() {
        return Err(AppError::Usage);
    }

    tracing::info!(
        seed = config.seed,
        width = config.grid_width,
        height = config.grid_height,
        ms_per_tick = config.ms_per_tick,
        ?max_ticks,
        "starting simulation"
    );

    let settings = LoopSettings {
        max_ticks,
        report_every: REPORT_EVERY,
        ..LoopSettings::new(config)
    };
    let (_state, handle) = spawn_game_loop(settings)?;
    let summary = handle.join().map_err(|_| AppError::Panicked)?;

    tracing::info!(
        ticks = summary.ticks,
        entities = summary.entities,
        dropped_triggers = summary.dropped_triggers,
        "simulation finished"
    );
    Ok(())
}
