//! Engine configuration.
//!
//! Wraps the board generation and motion settings with the driver's own
//! knobs. Configuration can be loaded from and saved to a TOML file; a
//! missing or malformed file falls back to defaults.

use arroyo_gameplay::MotionConfig;
use arroyo_world::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "arroyo.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Driver Settings ===
    /// Turns to simulate
    pub turns: u32,
    /// Log a board summary every this many turns (0 = only at the end)
    pub report_interval: u32,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,

    // === Board Settings ===
    /// Board generation
    pub generation: GenerationConfig,
    /// Agent motion
    pub motion: MotionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turns: 100,
            report_interval: 25,
            log_filter: "arroyo=info".to_string(),
            generation: GenerationConfig::default(),
            motion: MotionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut contents = String::new();
        if let Err(e) = fs::File::open(path).and_then(|mut f| f.read_to_string(&mut contents)) {
            warn!("Failed to read config file: {e}");
            return Self::default();
        }

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path, in the working directory.
    #[must_use]
    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Replace unusable values with defaults.
    pub fn validate(&mut self) {
        if let Err(e) = self.generation.validate() {
            warn!("Invalid generation settings ({e}), using defaults");
            self.generation = GenerationConfig::default();
        }

        let defaults = MotionConfig::default();
        if !self.motion.activation_fraction.is_finite() || self.motion.activation_fraction < 0.0 {
            self.motion.activation_fraction = defaults.activation_fraction;
        }
        if !self.motion.weight.is_finite() || self.motion.weight <= 0.0 {
            self.motion.weight = defaults.weight;
        }

        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
    }
}
