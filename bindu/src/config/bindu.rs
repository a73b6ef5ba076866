//! Main BinduConfig.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::analysis::AnalysisSection;
use super::logging::LoggingSection;
use super::octomap::OctomapSection;
use super::sensor::SensorSection;
use super::storage::StorageSection;
use super::synthetic::SyntheticSection;
use crate::error::{Error, Result};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "configs/bindu.yaml";

/// Full Bindu configuration loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct BinduConfig {
    /// Database settings
    #[serde(default)]
    pub storage: StorageSection,

    /// Sensor geometry
    #[serde(default)]
    pub sensor: SensorSection,

    /// Synthetic scan generation
    #[serde(default)]
    pub synthetic: SyntheticSection,

    /// Query catalog and reports
    #[serde(default)]
    pub analysis: AnalysisSection,

    /// External map builder
    #[serde(default)]
    pub octomap: OctomapSection,

    /// Log output
    #[serde(default)]
    pub logging: LoggingSection,
}

impl BinduConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    /// Load from the default path, or use defaults if it does not exist
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        let synthetic = &self.synthetic;
        if synthetic.altitude_rings == 0 || synthetic.encoder_angles == 0 {
            return Err(Error::Config(
                "synthetic scan dimensions must be positive".to_string(),
            ));
        }
        if !(synthetic.max_distance > 2.0) {
            return Err(Error::Config(format!(
                "synthetic.max_distance must exceed 2, got {}",
                synthetic.max_distance
            )));
        }
        if !(synthetic.noise_stddev >= 0.0) {
            return Err(Error::Config("synthetic.noise_stddev must not be negative".to_string()));
        }
        if !(self.octomap.resolution > 0.0) {
            return Err(Error::Config(format!(
                "octomap.resolution must be positive, got {}",
                self.octomap.resolution
            )));
        }
        if self.octomap.timeout_secs == 0 {
            return Err(Error::Config("octomap.timeout_secs must be positive".to_string()));
        }
        let geometry = &self.sensor.geometry;
        if geometry.ring_count == 0 || geometry.encoder_count == 0 || geometry.encoder_ticks_per_half_turn <= 0.0 {
            return Err(Error::Config("sensor geometry must have positive dimensions".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BinduConfig::default();
        assert_eq!(config.storage.database_path, "lidar_data.db");
        assert_eq!(config.sensor.geometry.ring_count, 32);
        assert!(!config.sensor.strict_shape);
        assert_eq!(config.synthetic.noise_stddev, 0.1);
        assert_eq!(config.octomap.resolution, 10.0);
        assert_eq!(config.octomap.args, vec!["--xyz_csv", "{csv}", "--out", "{out}"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = BinduConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = BinduConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.octomap.program, config.octomap.program);
        assert_eq!(parsed.sensor.geometry, config.sensor.geometry);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "
storage:
  database_path: /tmp/scans.db
sensor:
  strict_shape: true
  geometry:
    ring_count: 16
octomap:
  timeout_secs: 5
";
        let config = BinduConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.storage.database_path, "/tmp/scans.db");
        assert_eq!(config.storage.busy_timeout_ms, 5_000);
        assert!(config.sensor.strict_shape);
        assert_eq!(config.sensor.geometry.ring_count, 16);
        assert_eq!(config.sensor.geometry.encoder_count, 512);
        assert_eq!(config.octomap.timeout_secs, 5);
        assert_eq!(config.octomap.scan_limit, 3);
        assert!(config.analysis.catalog_path.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for yaml in [
            "synthetic:\n  max_distance: 2.0\n",
            "octomap:\n  resolution: 0\n",
            "synthetic:\n  altitude_rings: 0\n",
            "storage: [not, a, map]\n",
        ] {
            assert!(
                matches!(BinduConfig::from_yaml(yaml), Err(Error::Config(_))),
                "{:?} should be rejected",
                yaml
            );
        }
    }
}
