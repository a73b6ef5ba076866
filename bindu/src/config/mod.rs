//! Unified configuration loading for Bindu.
//!
//! Loads all configuration from a single YAML file with defaults for every
//! field; a missing file means all defaults.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bindu::config::BinduConfig;
//!
//! // Load from default path (configs/bindu.yaml)
//! let config = BinduConfig::load_default()?;
//! let store = ScanStore::open(&config.storage.database_path)?;
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`StorageSection`] | Database path, busy timeout |
//! | [`SensorSection`] | Sensor geometry, strict shape checking |
//! | [`SyntheticSection`] | Generator dimensions, objects, noise, seed |
//! | [`AnalysisSection`] | Query catalog, report directory |
//! | [`OctomapSection`] | Map builder program, arguments, timeout |
//! | [`LoggingSection`] | Default log level |
//!
//! ## Example YAML
//!
//! ```yaml
//! storage:
//!   database_path: lidar_data.db
//! synthetic:
//!   seed: 42            # 0 = entropy
//! octomap:
//!   program: ./my_point_cloud_reader
//!   args: ["--xyz_csv", "{csv}", "--out", "{out}"]
//!   timeout_secs: 120
//! ```

mod analysis;
mod bindu;
mod defaults;
mod logging;
mod octomap;
mod sensor;
mod storage;
mod synthetic;

pub use bindu::{BinduConfig, DEFAULT_CONFIG_PATH};

pub use analysis::AnalysisSection;
pub use logging::LoggingSection;
pub use octomap::OctomapSection;
pub use sensor::SensorSection;
pub use storage::StorageSection;
pub use synthetic::SyntheticSection;
