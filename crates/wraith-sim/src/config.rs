//! Simulation configuration.
//!
//! One TOML file holds the run settings (`[run]`) and the combat tuning
//! (`[combat.player]`, `[combat.enemy]`, `[combat.damage]`). Every table is
//! optional; a missing file means defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use wraith_combat::CombatConfig;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "wraith.toml";

/// Run settings for the scripted duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Seed for the enemy decisions and the frame jitter.
    pub seed: u64,
    /// Give up after this many simulated seconds.
    pub max_seconds: f32,
    /// Nominal variable-step frame length.
    pub frame_dt: f32,
    /// Random frame length variation, as a fraction of `frame_dt`.
    pub frame_jitter: f32,
    /// Fixed timestep.
    pub fixed_dt: f32,
    /// Largest accepted frame length.
    pub max_dt: f32,
    /// Starting distance between the fighters.
    pub start_distance: f32,
    /// Weapon reach used to turn a live hitbox into a contact.
    pub weapon_reach: f32,
    /// Seconds to keep simulating after a death.
    pub linger_seconds: f32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            seed: 7,
            max_seconds: 90.0,
            frame_dt: 1.0 / 60.0,
            frame_jitter: 0.25,
            fixed_dt: 1.0 / 50.0,
            max_dt: 0.25,
            start_distance: 12.0,
            weapon_reach: 2.2,
            linger_seconds: 1.0,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Run settings.
    pub run: RunSettings,
    /// Combat tuning.
    pub combat: CombatConfig,
}

impl SimConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("parsing simulation config")?;
        config.sanitize();
        config.combat.validate()?;
        Ok(config)
    }

    /// Load from a file. A missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("loading {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn sanitize(&mut self) {
        let run = &mut self.run;
        run.frame_dt = run.frame_dt.max(0.001);
        run.fixed_dt = run.fixed_dt.max(0.001);
        run.max_dt = run.max_dt.max(run.frame_dt);
        run.frame_jitter = run.frame_jitter.clamp(0.0, 0.9);
        run.max_seconds = run.max_seconds.max(0.0);
        run.weapon_reach = run.weapon_reach.max(0.0);
        run.linger_seconds = run.linger_seconds.max(0.0);
    }
}
