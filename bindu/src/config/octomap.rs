//! External map builder configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Map builder invocation settings
///
/// `args` are templates: `{csv}`, `{out}` and `{resolution}` are replaced
/// per invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OctomapSection {
    /// Builder executable
    #[serde(default = "defaults::builder_program")]
    pub program: String,

    /// Argument templates
    #[serde(default = "defaults::builder_args")]
    pub args: Vec<String>,

    /// Map file the builder writes
    #[serde(default = "defaults::map_output")]
    pub output_path: String,

    /// Directory for the temporary points CSV
    #[serde(default = "defaults::work_dir")]
    pub work_dir: String,

    /// Voxel edge length recorded with the map (m)
    #[serde(default = "defaults::map_resolution")]
    pub resolution: f64,

    /// Kill the builder after this many seconds
    #[serde(default = "defaults::builder_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of latest scans exported
    #[serde(default = "defaults::scan_limit")]
    pub scan_limit: usize,
}

impl OctomapSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OctomapSection {
    fn default() -> Self {
        Self {
            program: defaults::builder_program(),
            args: defaults::builder_args(),
            output_path: defaults::map_output(),
            work_dir: defaults::work_dir(),
            resolution: defaults::map_resolution(),
            timeout_secs: defaults::builder_timeout_secs(),
            scan_limit: defaults::scan_limit(),
        }
    }
}
