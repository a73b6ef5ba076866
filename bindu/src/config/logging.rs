//! Logging configuration section.

use serde::{Deserialize, Serialize};

use super::defaults;

/// Logging settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}
