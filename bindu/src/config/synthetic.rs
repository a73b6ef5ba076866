//! Synthetic scan configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Synthetic generator settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyntheticSection {
    /// Rows of each generated scan
    #[serde(default = "defaults::altitude_rings")]
    pub altitude_rings: usize,

    /// Columns of each generated scan
    #[serde(default = "defaults::encoder_angles")]
    pub encoder_angles: usize,

    /// Objects stamped into each scan
    #[serde(default = "defaults::num_objects")]
    pub num_objects: usize,

    /// Background range in meters (must exceed 2)
    #[serde(default = "defaults::max_distance")]
    pub max_distance: f64,

    /// Gaussian noise on object cells (m)
    #[serde(default = "defaults::noise_stddev")]
    pub noise_stddev: f64,

    /// RNG seed, 0 for entropy
    #[serde(default)]
    pub seed: u64,

    /// Scans produced by `generate` when no count is given
    #[serde(default = "defaults::scan_count")]
    pub scan_count: usize,

    /// Directory for fixture files
    #[serde(default = "defaults::fixture_dir")]
    pub fixture_dir: String,
}

impl Default for SyntheticSection {
    fn default() -> Self {
        Self {
            altitude_rings: defaults::altitude_rings(),
            encoder_angles: defaults::encoder_angles(),
            num_objects: defaults::num_objects(),
            max_distance: defaults::max_distance(),
            noise_stddev: defaults::noise_stddev(),
            seed: 0,
            scan_count: defaults::scan_count(),
            fixture_dir: defaults::fixture_dir(),
        }
    }
}
