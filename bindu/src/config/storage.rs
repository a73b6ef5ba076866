//! Storage configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Database settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageSection {
    /// SQLite database file
    #[serde(default = "defaults::database_path")]
    pub database_path: String,

    /// How long a connection waits on a locked database (ms)
    #[serde(default = "defaults::busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StorageSection {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_path: defaults::database_path(),
            busy_timeout_ms: defaults::busy_timeout_ms(),
        }
    }
}
