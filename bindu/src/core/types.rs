//! Scan, point and map artifact types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Surrogate key of a stored raw scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanId(pub i64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate key of a recorded map artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub i64);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in the sensor's Cartesian frame (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate (negative above the sensor)
    pub z: f64,
}

impl Point3 {
    /// Create a new point
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance from the sensor origin
    #[inline]
    pub fn range(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One full sensor sweep: range magnitudes indexed by altitude ring and
/// encoder tick, stored row-major (ring outer, tick inner).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanGrid {
    rings: usize,
    ticks: usize,
    data: Vec<f64>,
}

impl ScanGrid {
    /// Create a grid from row-major data.
    ///
    /// Fails with [`Error::Schema`] when either dimension is zero or the data
    /// length disagrees with `rings × ticks`.
    pub fn new(rings: usize, ticks: usize, data: Vec<f64>) -> Result<Self> {
        check_dimensions(data.len(), rings, ticks)?;
        Ok(Self { rings, ticks, data })
    }

    /// Create a grid filled with a single range value.
    pub fn filled(rings: usize, ticks: usize, value: f64) -> Result<Self> {
        let len = rings
            .checked_mul(ticks)
            .ok_or_else(|| Error::Schema(format!("{}x{} grid is too large", rings, ticks)))?;
        Self::new(rings, ticks, vec![value; len])
    }

    /// Create a grid from nested rows. Ragged input is a schema error.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let rings = rows.len();
        let ticks = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rings * ticks);
        for (ring, row) in rows.into_iter().enumerate() {
            if row.len() != ticks {
                return Err(Error::Schema(format!(
                    "ring {} has {} samples, expected {}",
                    ring,
                    row.len(),
                    ticks
                )));
            }
            data.extend(row);
        }
        Self::new(rings, ticks, data)
    }

    /// Re-check the dimension invariant, e.g. after deserialization.
    pub fn validate(self) -> Result<Self> {
        check_dimensions(self.data.len(), self.rings, self.ticks)?;
        Ok(self)
    }

    /// Number of altitude rings (rows)
    pub fn rings(&self) -> usize {
        self.rings
    }

    /// Number of encoder ticks per ring (columns)
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed grid
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major sample slice
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Range at (ring, tick)
    pub fn get(&self, ring: usize, tick: usize) -> Option<f64> {
        if ring < self.rings && tick < self.ticks {
            Some(self.data[ring * self.ticks + tick])
        } else {
            None
        }
    }

    /// Set the range at (ring, tick). Out-of-bounds writes are ignored.
    pub fn set(&mut self, ring: usize, tick: usize, value: f64) {
        if ring < self.rings && tick < self.ticks {
            self.data[ring * self.ticks + tick] = value;
        }
    }

    /// Iterate over rings as slices
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.ticks)
    }
}

/// Verify that a flat sample count matches the declared dimensions.
pub(crate) fn check_dimensions(len: usize, rings: usize, ticks: usize) -> Result<()> {
    if rings == 0 || ticks == 0 {
        return Err(Error::Schema(format!(
            "scan dimensions must be positive, got {}x{}",
            rings, ticks
        )));
    }
    match rings.checked_mul(ticks) {
        Some(expected) if expected == len => Ok(()),
        _ => Err(Error::Schema(format!(
            "scan has {} samples but declares {}x{}",
            len, rings, ticks
        ))),
    }
}

/// Metadata of a stored raw scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Scan key
    pub scan_id: ScanId,
    /// Ingest time (RFC 3339, UTC)
    pub timestamp: String,
    /// Declared altitude ring count
    pub altitude_count: usize,
    /// Declared encoder tick count
    pub encoder_count: usize,
}

impl ScanSummary {
    /// Number of points a complete point cloud for this scan holds
    pub fn expected_points(&self) -> usize {
        self.altitude_count * self.encoder_count
    }
}

/// A completed external occupancy-map build.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapArtifact {
    /// Artifact key
    pub map_id: MapId,
    /// Record time (RFC 3339, UTC)
    pub timestamp: String,
    /// Voxel edge length in meters
    pub resolution: f64,
    /// Location of the builder's output
    pub file_path: String,
    /// Points consumed by the build
    pub point_count: u64,
}
