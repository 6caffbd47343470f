//! Noise-to-elevation synthesis.
//!
//! Raw elevation comes from the noise field, remapped to `[0, max]`. A steep
//! power of the distance from the basin is added on top so the middle of the
//! board stays low (the valley) and the rim climbs to the ceiling regardless
//! of noise. The result is bucketed into the five elevation levels.

use arroyo_common::{ConfigError, Location};
use tracing::debug;

use crate::config::ElevationConfig;
use crate::grid::Grid;
use crate::noise_field::{NoiseField, NoiseSource};

/// Radius used to normalize basin distance: `floor(sqrt(rows/2 + cols/2))`.
#[must_use]
pub fn falloff_radius(rows: usize, cols: usize) -> f64 {
    ((rows / 2 + cols / 2) as f64).sqrt().floor()
}

/// Populates grid elevations from a noise source.
#[derive(Debug)]
pub struct TerrainSynthesizer<N = NoiseField> {
    params: ElevationConfig,
    noise: N,
}

impl<N: NoiseSource> TerrainSynthesizer<N> {
    /// Creates a synthesizer.
    #[must_use]
    pub fn new(params: ElevationConfig, noise: N) -> Self {
        Self { params, noise }
    }

    /// Elevation parameters.
    #[must_use]
    pub const fn params(&self) -> &ElevationConfig {
        &self.params
    }

    /// Buckets a raw elevation into a level. Ties go to the higher level.
    #[must_use]
    pub fn quantize(&self, raw: f64) -> u8 {
        let max = f64::from(self.params.max);
        let [t1, t2, t3, t4] = self.params.thresholds;
        if raw >= t4 * max {
            4
        } else if raw >= t3 * max {
            3
        } else if raw >= t2 * max {
            2
        } else if raw >= t1 * max {
            1
        } else {
            0
        }
    }

    /// Noise elevation at a cell, remapped to `[0, max]`.
    ///
    /// Noise is sampled at `(row, col)`; swapping the axes changes every
    /// board generated from a given seed.
    fn noise_elevation(&self, loc: Location) -> f64 {
        let sample = self.noise.sample(f64::from(loc.y), f64::from(loc.x));
        let unit = ((sample + 1.0) / 2.0).clamp(0.0, 1.0);
        unit * f64::from(self.params.max)
    }

    /// Raw (pre-quantization) elevation for a cell, including the falloff
    /// bias, truncated and clamped to `max`.
    #[must_use]
    pub fn raw_elevation(&self, loc: Location, center: Location, radius: f64, divisor: f64) -> f64 {
        let distance = loc.euclidean_distance(center);
        let bias = (distance / radius / divisor).powf(self.params.falloff_exponent);
        (self.noise_elevation(loc) + bias)
            .trunc()
            .min(f64::from(self.params.max))
    }

    /// Overwrites every cell's elevation.
    pub fn synthesize(&self, grid: &mut Grid) -> Result<(), ConfigError> {
        let (rows, cols) = (grid.rows(), grid.cols());
        self.params.validate_for(rows, cols)?;

        let divisor = self.params.falloff_divisor(rows);
        let radius = falloff_radius(rows, cols);
        if radius < 1.0 {
            return Err(ConfigError::InvalidDimensions { rows, cols });
        }
        let center = grid.center();

        for index in 0..grid.len() {
            let loc = grid.location_of(index);
            let level = self.quantize(self.raw_elevation(loc, center, radius, divisor));
            grid.set_elevation(loc, level)
                .map_err(|_| ConfigError::InvalidDimensions { rows, cols })?;
        }

        debug!(
            rows,
            cols,
            divisor,
            radius,
            histogram = ?grid.elevation_histogram(),
            "Synthesized terrain"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;
    use crate::grid::MAX_ELEVATION;
    use crate::noise_field::ConstantNoise;

    fn flat(sample: f64) -> TerrainSynthesizer<ConstantNoise> {
        TerrainSynthesizer::new(ElevationConfig::default(), ConstantNoise(sample))
    }

    #[test]
    fn test_falloff_radius_matches_board_sizes() {
        assert_eq!(falloff_radius(64, 64), 8.0);
        assert_eq!(falloff_radius(128, 128), 11.0);
    }

    #[test]
    fn test_quantize_thresholds_round_up() {
        let synth = flat(0.0);
        assert_eq!(synth.quantize(820.0), 4);
        assert_eq!(synth.quantize(819.0), 3);
        assert_eq!(synth.quantize(450.0), 3);
        assert_eq!(synth.quantize(20.0), 2);
        assert_eq!(synth.quantize(10.0), 1);
        assert_eq!(synth.quantize(9.0), 0);
        assert_eq!(synth.quantize(0.0), 0);
    }

    #[test]
    fn test_center_low_rim_high() {
        // Noise at -1 maps to raw 0, so only the falloff contributes.
        let synth = flat(-1.0);
        let mut grid = Grid::new(64, 64).expect("grid");
        synth.synthesize(&mut grid).expect("synthesize");

        assert_eq!(grid[grid.center()].elevation(), 0);
        assert_eq!(grid[Location::new(0, 0)].elevation(), MAX_ELEVATION);
        assert_eq!(grid[Location::new(63, 63)].elevation(), MAX_ELEVATION);
    }

    #[test]
    fn test_mid_noise_gives_dirt_in_valley() {
        // Noise 0 maps to raw 500, between the 0.45 and 0.82 cut points.
        let synth = flat(0.0);
        let mut grid = Grid::new(64, 64).expect("grid");
        synth.synthesize(&mut grid).expect("synthesize");
        assert_eq!(grid[grid.center()].elevation(), 3);
    }

    #[test]
    fn test_degenerate_rows_rejected_before_mutation() {
        let synth = flat(0.0);
        let mut grid = Grid::new(8, 8).expect("grid");
        grid.fill(2).expect("fill");
        assert!(matches!(
            synth.synthesize(&mut grid),
            Err(ConfigError::DegenerateDivisor { rows: 8, .. })
        ));
        assert!(grid.cells().iter().all(|c| c.elevation() == 2));
    }

    #[test]
    fn test_levels_always_in_range() {
        let synth = TerrainSynthesizer::new(
            ElevationConfig::default(),
            NoiseField::new(3, &NoiseConfig::default()),
        );
        let mut grid = Grid::new(96, 72).expect("grid");
        synth.synthesize(&mut grid).expect("synthesize");
        assert!(grid.cells().iter().all(|c| c.elevation() <= MAX_ELEVATION));
        assert_eq!(grid.elevation_histogram().iter().sum::<usize>(), grid.len());
    }
}
