//! Synthetic scan generation.
//!
//! Produces plausible range grids without a sensor: a uniform background at
//! `max_distance` with rectangular "objects" stamped in front of it. The output
//! is meant for exercising the pipeline, not for checking geometry.
//!
//! | Parameter | Default | Meaning |
//! |-----------|---------|---------|
//! | `altitude_rings` | 32 | Grid rows |
//! | `encoder_angles` | 512 | Grid columns |
//! | `num_objects` | 5 | Blobs per scan |
//! | `max_distance` | 10.0 | Background range (m) |
//! | `noise_stddev` | 0.1 | Per-cell Gaussian noise on blobs (m) |

pub mod fixtures;
pub mod noise;

use crate::config::SyntheticSection;
use crate::core::types::ScanGrid;
use crate::error::{Error, Result};

pub use fixtures::{load_scan, save_scan, save_synthetic_scans};
pub use noise::NoiseGenerator;

/// Smallest and largest-exclusive half-size of a generated object, in cells
const OBJECT_SIZE_RANGE: (usize, usize) = (3, 10);

/// Closest range an object may be placed at (m)
const MIN_OBJECT_DISTANCE: f64 = 1.0;

/// Random range-grid generator.
#[derive(Clone, Debug)]
pub struct SyntheticScanGenerator {
    altitude_rings: usize,
    encoder_angles: usize,
    num_objects: usize,
    max_distance: f64,
    noise_stddev: f64,
    noise: NoiseGenerator,
}

impl SyntheticScanGenerator {
    /// Create a generator for grids of the given size
    pub fn new(altitude_rings: usize, encoder_angles: usize, noise: NoiseGenerator) -> Self {
        let defaults = SyntheticSection::default();
        Self {
            altitude_rings,
            encoder_angles,
            num_objects: defaults.num_objects,
            max_distance: defaults.max_distance,
            noise_stddev: defaults.noise_stddev,
            noise,
        }
    }

    /// Create a generator from configuration
    pub fn from_config(config: &SyntheticSection) -> Self {
        Self {
            altitude_rings: config.altitude_rings,
            encoder_angles: config.encoder_angles,
            num_objects: config.num_objects,
            max_distance: config.max_distance,
            noise_stddev: config.noise_stddev,
            noise: NoiseGenerator::new(config.seed),
        }
    }

    /// Set the per-cell noise standard deviation used for object cells
    pub fn with_noise_stddev(mut self, stddev: f64) -> Self {
        self.noise_stddev = stddev;
        self
    }

    /// Generate one scan with `num_objects` blobs over a `max_distance` background.
    ///
    /// Each blob has a random center, a half-size in `[3, 10)` cells and a
    /// constant range in `[1, max_distance - 1)` plus per-cell noise. Blobs
    /// are clipped to the grid.
    pub fn generate_environment(&mut self, num_objects: usize, max_distance: f64) -> Result<ScanGrid> {
        if !(max_distance > MIN_OBJECT_DISTANCE + 1.0) || !max_distance.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "max_distance must be greater than {}, got {}",
                MIN_OBJECT_DISTANCE + 1.0,
                max_distance
            )));
        }
        let mut grid = ScanGrid::filled(self.altitude_rings, self.encoder_angles, max_distance)?;

        for _ in 0..num_objects {
            let ring = self.noise.index(self.altitude_rings);
            let tick = self.noise.index(self.encoder_angles);
            let size = self.noise.int_in(OBJECT_SIZE_RANGE.0, OBJECT_SIZE_RANGE.1);
            let distance = self.noise.uniform_in(MIN_OBJECT_DISTANCE, max_distance - 1.0);

            let rings = ring.saturating_sub(size)..(ring + size).min(self.altitude_rings);
            for r in rings {
                let ticks = tick.saturating_sub(size)..(tick + size).min(self.encoder_angles);
                for t in ticks {
                    let value = distance + self.noise.gaussian(self.noise_stddev);
                    grid.set(r, t, value);
                }
            }
        }

        log::debug!(
            "Synth: {}x{} scan with {} objects",
            self.altitude_rings,
            self.encoder_angles,
            num_objects
        );
        Ok(grid)
    }

    /// Generate `count` scans with the configured object count and range
    pub fn generate_multiple(&mut self, count: usize) -> Result<Vec<ScanGrid>> {
        let (num_objects, max_distance) = (self.num_objects, self.max_distance);
        (0..count)
            .map(|_| self.generate_environment(num_objects, max_distance))
            .collect()
    }
}

impl Default for SyntheticScanGenerator {
    fn default() -> Self {
        Self::from_config(&SyntheticSection::default())
    }
}
