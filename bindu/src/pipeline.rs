//! Ingestion: raw scan → Cartesian points → store.
//!
//! Each scan is stored as a raw row followed by its point batch. In a batch,
//! a failing scan is reported and the remaining scans are still ingested.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SensorSection;
use crate::core::{Point3, ScanGrid, ScanId, SensorGeometry};
use crate::error::{Error, Result};
use crate::store::ScanStore;
use crate::synth::load_scan;

/// Outcome of one successful ingestion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IngestedScan {
    pub scan_id: ScanId,
    pub point_count: usize,
}

/// Outcome of a batch; failures are keyed by input position
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<IngestedScan>,
    pub failures: Vec<(usize, Error)>,
}

impl IngestReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Axis-aligned extent of a point set
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PointBounds {
    pub min: Point3,
    pub max: Point3,
}

impl PointBounds {
    /// `None` for an empty set
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points[1..].iter().fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: Point3::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
                max: Point3::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
            },
        ))
    }
}

/// Transforms scans and writes them to a store.
#[derive(Clone, Debug)]
pub struct Pipeline {
    store: ScanStore,
    geometry: SensorGeometry,
    strict_shape: bool,
}

impl Pipeline {
    pub fn new(store: ScanStore, geometry: SensorGeometry) -> Self {
        Self {
            store,
            geometry,
            strict_shape: false,
        }
    }

    pub fn from_config(store: ScanStore, sensor: &SensorSection) -> Self {
        Self::new(store, sensor.geometry.clone()).with_strict_shape(sensor.strict_shape)
    }

    /// Reject scans whose shape is not the geometry's native shape
    pub fn with_strict_shape(mut self, strict: bool) -> Self {
        self.strict_shape = strict;
        self
    }

    pub fn store(&self) -> &ScanStore {
        &self.store
    }

    /// Transform and store one scan
    pub fn ingest(&self, grid: &ScanGrid) -> Result<IngestedScan> {
        let points = if self.strict_shape {
            self.geometry.transform_checked(grid)?
        } else {
            self.geometry.transform(grid)
        };
        let scan_id = self
            .store
            .store_raw_scan(grid.as_slice(), grid.rings(), grid.ticks())?;
        let point_count = match self.store.store_point_cloud(scan_id, &points) {
            Ok(count) => count,
            Err(e) => {
                self.discard(scan_id);
                return Err(e);
            }
        };

        log::info!("Stored scan {} with {} points", scan_id, point_count);
        Ok(IngestedScan {
            scan_id,
            point_count,
        })
    }

    /// Drop a raw scan whose points could not be stored
    fn discard(&self, scan_id: ScanId) {
        match self.store.delete_scan(scan_id) {
            Ok(_) => log::warn!("Discarded raw scan {} after its points failed to store", scan_id),
            Err(e) => log::warn!(
                "Raw scan {} has no points and could not be removed: {}",
                scan_id,
                e
            ),
        }
    }

    /// Ingest every scan, collecting failures
    pub fn ingest_batch(&self, grids: &[ScanGrid]) -> IngestReport {
        let mut report = IngestReport::default();
        for (index, grid) in grids.iter().enumerate() {
            match self.ingest(grid) {
                Ok(scan) => report.ingested.push(scan),
                Err(e) => {
                    log::warn!("Scan {} of batch failed: {}", index, e);
                    report.failures.push((index, e));
                }
            }
        }
        report
    }

    /// Load and ingest fixture files, collecting failures
    pub fn ingest_files<P: AsRef<Path>>(&self, paths: &[P]) -> IngestReport {
        let mut report = IngestReport::default();
        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            match load_scan(path).and_then(|grid| self.ingest(&grid)) {
                Ok(scan) => {
                    log::debug!("Ingested {}", path.display());
                    report.ingested.push(scan);
                }
                Err(e) => {
                    log::warn!("Failed to ingest {}: {}", path.display(), e);
                    report.failures.push((index, e));
                }
            }
        }
        report
    }

    /// Bounds of each of the latest scans that has points, newest first
    pub fn latest_bounds(&self, limit: usize) -> Result<Vec<(ScanId, usize, Option<PointBounds>)>> {
        let mut bounds = Vec::new();
        for scan in self.store.latest_scans(limit)? {
            let points = self.store.points_for_scan(scan.scan_id)?.unwrap_or_default();
            bounds.push((scan.scan_id, points.len(), PointBounds::from_points(&points)));
        }
        Ok(bounds)
    }
}

/// Sorted `*.scan` files in a directory
pub fn fixture_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == crate::synth::fixtures::FIXTURE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> Pipeline {
        let store = ScanStore::open(dir.path().join("lidar.db")).unwrap();
        Pipeline::new(store, SensorGeometry::default())
    }

    #[test]
    fn test_ingest_stores_all_points() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let grid = ScanGrid::filled(2, 3, 4.0).unwrap();

        let scan = pipeline.ingest(&grid).unwrap();
        assert_eq!(scan.point_count, 6);
        let points = pipeline.store().points_for_scan(scan.scan_id).unwrap().unwrap();
        assert_eq!(points, SensorGeometry::default().transform(&grid));
    }

    #[test]
    fn test_strict_shape_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir).with_strict_shape(true);
        let grid = ScanGrid::filled(2, 3, 4.0).unwrap();

        assert!(matches!(pipeline.ingest(&grid), Err(Error::Schema(_))));
        assert_eq!(pipeline.store().scan_count().unwrap(), 0);
    }

    #[test]
    fn test_failed_point_batch_discards_raw_scan() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        // SQLite stores NaN as NULL, which the point columns reject
        let grid = ScanGrid::filled(1, 2, f64::NAN).unwrap();

        assert!(matches!(pipeline.ingest(&grid), Err(Error::Storage { .. })));
        assert_eq!(pipeline.store().scan_count().unwrap(), 0);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(PointBounds::from_points(&[]), None);
        let b = PointBounds::from_points(&[
            Point3::new(1.0, -2.0, 0.0),
            Point3::new(-1.0, 5.0, 0.5),
        ])
        .unwrap();
        assert_eq!(b.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 5.0, 0.5));
    }
}
