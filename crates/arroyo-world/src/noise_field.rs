//! Coherent noise source for terrain synthesis.

use noise::{Fbm, MultiFractal, NoiseFn, OpenSimplex};

use crate::config::NoiseConfig;

/// Anything that yields a scalar in roughly `[-1, 1]` per sample point.
pub trait NoiseSource {
    /// Samples the field at `(x, y)`.
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// Fractal OpenSimplex noise.
pub struct NoiseField {
    source: Fbm<OpenSimplex>,
    octaves: usize,
    frequency: f64,
}

impl NoiseField {
    /// Creates a seeded field.
    #[must_use]
    pub fn new(seed: u32, config: &NoiseConfig) -> Self {
        let source = Fbm::<OpenSimplex>::new(seed)
            .set_octaves(config.octaves)
            .set_frequency(config.frequency);
        Self {
            source,
            octaves: config.octaves,
            frequency: config.frequency,
        }
    }
}

impl NoiseSource for NoiseField {
    fn sample(&self, x: f64, y: f64) -> f64 {
        self.source.get([x, y])
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("octaves", &self.octaves)
            .field("frequency", &self.frequency)
            .finish()
    }
}

/// Same value everywhere. Handy for tests and flat boards.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_samples() {
        let config = NoiseConfig::default();
        let a = NoiseField::new(7, &config);
        let b = NoiseField::new(7, &config);
        for i in 0..32 {
            let (x, y) = (f64::from(i) * 1.7, f64::from(i) * 0.3);
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = NoiseConfig::default();
        let a = NoiseField::new(1, &config);
        let b = NoiseField::new(2, &config);
        let differs = (0..64).any(|i| {
            let p = f64::from(i) * 3.1;
            a.sample(p, p * 0.5) != b.sample(p, p * 0.5)
        });
        assert!(differs);
    }
}
