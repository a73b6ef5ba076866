//! Sensor configuration section.

use serde::{Deserialize, Serialize};

use crate::core::SensorGeometry;

/// Sensor geometry and ingestion strictness
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SensorSection {
    /// Angular layout used by the coordinate transform
    #[serde(default)]
    pub geometry: SensorGeometry,

    /// Reject scans whose shape differs from the geometry's native shape
    #[serde(default)]
    pub strict_shape: bool,
}
