//! Generation configuration.
//!
//! Everything here is read once when a board is generated and never
//! consulted afterward. Configurations can be parsed from TOML; every
//! section falls back to its defaults when omitted.

use arroyo_common::{ArroyoError, ArroyoResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::grid::{Passability, MAX_ELEVATION};

/// Coherent noise parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Base frequency
    pub frequency: f64,
    /// Fractal octaves
    pub octaves: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            frequency: 0.06,
            octaves: 4,
        }
    }
}

/// Elevation synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Raw elevation ceiling
    pub max: u32,
    /// Ascending cut points (fractions of `max`) for levels 1 through 4
    pub thresholds: [f64; 4],
    /// Exponent applied to the normalized distance from the basin
    pub falloff_exponent: f64,
    /// `a` in the divisor fit `a * ln(b * rows)`
    pub log_fit_scale: f64,
    /// `b` in the divisor fit `a * ln(b * rows)`
    pub log_fit_offset: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            max: 1000,
            thresholds: [0.01, 0.02, 0.45, 0.82],
            falloff_exponent: 15.0,
            // Fit through (120, 3.3), (240, 4.8), (320, 5.2), (480, 6.6)
            log_fit_scale: 2.29928,
            log_fit_offset: 0.033_747_7,
        }
    }
}

impl ElevationConfig {
    /// Falloff divisor for a grid with `rows` rows.
    #[must_use]
    pub fn falloff_divisor(&self, rows: usize) -> f64 {
        self.log_fit_scale * (self.log_fit_offset * rows as f64).ln()
    }

    /// Checks the divisor and thresholds for a `rows x cols` grid.
    pub fn validate_for(&self, rows: usize, cols: usize) -> Result<(), ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidDimensions { rows, cols });
        }
        let divisor = self.falloff_divisor(rows);
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(ConfigError::DegenerateDivisor { rows, divisor });
        }
        let t = self.thresholds;
        let in_range = t.iter().all(|v| (0.0..=1.0).contains(v));
        let ascending = t.windows(2).all(|w| w[0] <= w[1]);
        if !in_range || !ascending {
            return Err(ConfigError::InvalidThresholds(t));
        }
        Ok(())
    }
}

/// Widest channel a river may be configured with.
pub const MAX_RIVER_WIDTH: u32 = 4096;

/// River carving parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    /// Number of rivers, at most one per border
    pub count: usize,
    /// Minimum channel width; each carve rolls `[width, 2 * width)`
    pub width: u32,
    /// Terrain weight multiplier for river routing
    pub weight: f64,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            count: 2,
            width: 3,
            weight: 10.0,
        }
    }
}

impl RiverConfig {
    /// Checks width and weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::InvalidRiverWidth);
        }
        if self.width > MAX_RIVER_WIDTH {
            return Err(ConfigError::RiverTooWide {
                width: self.width,
                max: MAX_RIVER_WIDTH,
            });
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(ConfigError::InvalidWeight(self.weight));
        }
        Ok(())
    }

    /// Checks the parameters against a `rows x cols` board: the width may
    /// not exceed the board's smaller side.
    pub fn validate_for(&self, rows: usize, cols: usize) -> Result<(), ConfigError> {
        self.validate()?;
        let max = u32::try_from(rows.min(cols)).unwrap_or(u32::MAX);
        if self.width > max {
            return Err(ConfigError::RiverTooWide {
                width: self.width,
                max,
            });
        }
        Ok(())
    }
}

/// Board generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    /// RNG and noise seed
    pub seed: u64,
    /// Elevation levels treated as occupied terrain
    pub impassable_levels: Vec<u8>,
    /// Noise parameters
    pub noise: NoiseConfig,
    /// Elevation parameters
    pub elevation: ElevationConfig,
    /// River parameters
    pub rivers: RiverConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            rows: 64,
            cols: 64,
            seed: 12345,
            impassable_levels: vec![0, MAX_ELEVATION],
            noise: NoiseConfig::default(),
            elevation: ElevationConfig::default(),
            rivers: RiverConfig::default(),
        }
    }
}

impl GenerationConfig {
    /// Default configuration with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Sets the grid dimensions.
    #[must_use]
    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Rejects configurations that cannot generate a board.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.elevation.validate_for(self.rows, self.cols)?;
        self.rivers.validate_for(self.rows, self.cols)?;
        if self.noise.octaves == 0 {
            return Err(ConfigError::InvalidNoise("octaves must be at least 1".into()));
        }
        if !self.noise.frequency.is_finite() || self.noise.frequency <= 0.0 {
            return Err(ConfigError::InvalidNoise(format!(
                "frequency must be positive, got {}",
                self.noise.frequency
            )));
        }
        if let Some(&level) = self
            .impassable_levels
            .iter()
            .find(|&&level| level > MAX_ELEVATION)
        {
            return Err(ConfigError::InvalidImpassableLevel(level));
        }
        Ok(())
    }

    /// Passability policy built from `impassable_levels`.
    #[must_use]
    pub fn passability(&self) -> Passability {
        Passability::blocking(&self.impassable_levels)
    }

    /// Noise seed. The noise library takes 32-bit seeds.
    #[must_use]
    pub const fn noise_seed(&self) -> u32 {
        self.seed as u32
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> ArroyoResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ArroyoError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> ArroyoResult<String> {
        toml::to_string_pretty(self).map_err(|e| ArroyoError::Serialization(e.to_string()))
    }

    /// Loads and validates a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ArroyoResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded generation config from {}", path.display());
        Ok(config)
    }
}
