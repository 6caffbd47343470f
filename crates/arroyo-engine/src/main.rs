//! # Arroyo
//!
//! Headless entry point: generates a desert board, scatters flora and
//! fauna, and lets the agents move for a configured number of turns.
//!
//! Usage: `arroyo [CONFIG] [--write-config]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use arroyo_engine::{EngineConfig, Session};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut write_config = false;
    for arg in std::env::args().skip(1) {
        if arg == "--write-config" {
            write_config = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let config = match &config_path {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("arroyo=info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Arroyo starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if write_config {
        match &config_path {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        return Ok(());
    }

    let mut session = Session::new(&config)?;
    let summary = session.run(config.turns)?;
    info!(
        turns = summary.turns,
        moves = summary.moves,
        blocked = summary.blocked,
        bumps = summary.bumps,
        attacks = summary.attacks,
        kills = summary.kills,
        removed = summary.removed,
        player_life = summary.player_life,
        "Session complete"
    );

    info!("Arroyo shutdown complete");
    Ok(())
}
