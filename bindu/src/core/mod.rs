//! Core scan types and the coordinate transform.

pub mod geometry;
pub mod types;

pub use geometry::{SensorGeometry, transform};
pub use types::{MapArtifact, MapId, Point3, ScanGrid, ScanId, ScanSummary};
