//! # Wraith Sim
//!
//! Headless driver for the Project Wraith combat core.
//!
//! Loads the combat tuning, then runs a scripted player-versus-enemy duel on
//! a variable/fixed step clock and logs what happens. Pass a config path as
//! the first argument (defaults to `wraith.toml`); set `RUST_LOG` to see
//! per-frame detail.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod duel;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};
use crate::duel::Duel;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wraith=info".parse()?))
        .init();

    info!("Project Wraith duel starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&path)?;

    let summary = Duel::new(config)?.run();
    match summary.winner {
        Some(winner) => info!(?winner, seconds = summary.seconds, "duel decided"),
        None => info!(seconds = summary.seconds, "duel timed out"),
    }
    Ok(())
}
