//! Board generation: terrain synthesis followed by river carving.

use arroyo_common::{ArroyoResult, ConfigError};
use fastrand::Rng;
use tracing::info;

use crate::config::GenerationConfig;
use crate::grid::Grid;
use crate::hydrology::{CarveSummary, HydrologyCarver};
use crate::noise_field::NoiseField;
use crate::synthesis::TerrainSynthesizer;

/// Seeded board generator.
#[derive(Debug)]
pub struct WorldGenerator {
    /// Configuration
    config: GenerationConfig,
    /// Elevation synthesis
    synthesizer: TerrainSynthesizer,
    /// River carving
    carver: HydrologyCarver,
}

impl WorldGenerator {
    /// Creates a generator, rejecting configurations that cannot produce a
    /// board.
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let noise = NoiseField::new(config.noise_seed(), &config.noise);
        let synthesizer = TerrainSynthesizer::new(config.elevation.clone(), noise);
        let carver = HydrologyCarver::new(config.rivers.clone())?;

        Ok(Self {
            config,
            synthesizer,
            carver,
        })
    }

    /// Creates a generator with default config and the given seed.
    pub fn with_seed(seed: u64) -> Result<Self, ConfigError> {
        Self::new(GenerationConfig::with_seed(seed))
    }

    /// Generates a board from the configured seed.
    ///
    /// The same configuration always yields the same grid.
    pub fn generate(&mut self) -> ArroyoResult<Grid> {
        let mut rng = Rng::with_seed(self.config.seed);
        self.generate_with_rng(&mut rng).map(|(grid, _)| grid)
    }

    /// Generates a board drawing from the caller's RNG.
    ///
    /// Noise still comes from the configured seed; only river placement and
    /// channel widths consume `rng`.
    pub fn generate_with_rng(&mut self, rng: &mut Rng) -> ArroyoResult<(Grid, CarveSummary)> {
        let mut grid = Grid::with_passability(
            self.config.rows,
            self.config.cols,
            self.config.passability(),
        )?;
        self.synthesizer.synthesize(&mut grid)?;
        let summary = self.carver.carve(&mut grid, rng);

        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            seed = self.config.seed,
            rivers = summary.rivers.len(),
            histogram = ?grid.elevation_histogram(),
            "Generated board"
        );
        Ok((grid, summary))
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }
}
