//! Occupancy map export through an external builder.
//!
//! Points of the latest scans are written to a temporary `x,y,z` CSV, the
//! builder turns that file into a map, and the result is recorded as a
//! [`MapArtifact`]. The CSV is removed whether or not the build succeeds, and
//! no artifact is recorded for a failed build.

pub mod builder;
pub mod csv;

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::OctomapSection;
use crate::core::types::{MapArtifact, Point3};
use crate::error::{Error, Result};
use crate::store::ScanStore;

pub use builder::{BuildJob, MapBuilder, ProcessMapBuilder};
pub use csv::{CSV_HEADER, write_points, write_points_csv};

/// Exports stored points to a map file.
pub struct MapExporter<B: MapBuilder> {
    store: ScanStore,
    builder: B,
    output_path: PathBuf,
    work_dir: PathBuf,
    resolution: f64,
}

impl MapExporter<ProcessMapBuilder> {
    /// Exporter running the configured builder executable
    pub fn from_config(store: ScanStore, config: &OctomapSection) -> Self {
        Self::new(store, ProcessMapBuilder::from_config(config), config)
    }
}

impl<B: MapBuilder> MapExporter<B> {
    pub fn new(store: ScanStore, builder: B, config: &OctomapSection) -> Self {
        Self {
            store,
            builder,
            output_path: PathBuf::from(&config.output_path),
            work_dir: PathBuf::from(&config.work_dir),
            resolution: config.resolution,
        }
    }

    /// Build a map from the points of the `limit` most recent scans
    pub fn export_latest(&self, limit: usize) -> Result<MapArtifact> {
        let scans = self.store.latest_scans(limit)?;
        let mut points: Vec<Point3> = Vec::new();
        for scan in &scans {
            match self.store.points_for_scan(scan.scan_id)? {
                Some(scan_points) if !scan_points.is_empty() => points.extend(scan_points),
                _ => log::warn!("Map export: scan {} has no stored points, skipped", scan.scan_id),
            }
        }
        if points.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "no stored points in the latest {} scans",
                limit
            )));
        }
        log::info!(
            "Map export: {} points from {} scans",
            points.len(),
            scans.len()
        );
        self.export_points(&points)
    }

    /// Build a map from an explicit point list
    pub fn export_points(&self, points: &[Point3]) -> Result<MapArtifact> {
        fs::create_dir_all(&self.work_dir)?;
        let csv = TempCsv::new(
            self.work_dir
                .join(format!("bindu_points_{}.csv", std::process::id())),
        );
        let written = write_points_csv(csv.path(), points)?;

        let job = BuildJob {
            csv: csv.path(),
            output: &self.output_path,
            resolution: self.resolution,
        };
        if let Err(e) = self.builder.build(&job) {
            log::warn!("Map export: {} failed: {}", self.builder.name(), e);
            return Err(e);
        }

        let file_path = self.output_path.to_string_lossy();
        let map_id = self
            .store
            .store_map_artifact(self.resolution, &file_path, written as u64)?;
        log::info!("Map export: created map {} at {}", map_id, file_path);

        self.store.map_artifact(map_id)?.ok_or_else(|| {
            Error::Schema(format!("map artifact {} missing after insert", map_id))
        })
    }
}

/// CSV path removed on drop
struct TempCsv {
    path: PathBuf,
}

impl TempCsv {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempCsv {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records the CSV it was given and optionally fails
    struct FakeBuilder {
        fail: bool,
        seen_csv: RefCell<Option<(PathBuf, String)>>,
    }

    impl MapBuilder for FakeBuilder {
        fn name(&self) -> &str {
            "fake"
        }

        fn build(&self, job: &BuildJob<'_>) -> Result<()> {
            let text = fs::read_to_string(job.csv)?;
            *self.seen_csv.borrow_mut() = Some((job.csv.to_path_buf(), text));
            if self.fail {
                return Err(Error::ExternalTool {
                    tool: "fake".into(),
                    status: "exit status: 1".into(),
                    stderr: String::new(),
                });
            }
            fs::write(job.output, b"map")?;
            Ok(())
        }
    }

    fn setup(dir: &TempDir, fail: bool) -> MapExporter<FakeBuilder> {
        let store = ScanStore::open(dir.path().join("lidar.db")).unwrap();
        let id = store.store_raw_scan(&[1.0, 2.0], 1, 2).unwrap();
        store
            .store_point_cloud(id, &[Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)])
            .unwrap();
        let config = OctomapSection {
            output_path: dir.path().join("out.bt").to_string_lossy().into_owned(),
            work_dir: dir.path().join("work").to_string_lossy().into_owned(),
            ..OctomapSection::default()
        };
        let builder = FakeBuilder {
            fail,
            seen_csv: RefCell::new(None),
        };
        MapExporter::new(store, builder, &config)
    }

    #[test]
    fn test_export_records_artifact_and_removes_csv() {
        let dir = TempDir::new().unwrap();
        let exporter = setup(&dir, false);

        let artifact = exporter.export_latest(3).unwrap();
        assert_eq!(artifact.point_count, 2);
        assert_eq!(artifact.resolution, 10.0);
        assert!(artifact.file_path.ends_with("out.bt"));

        let (csv_path, text) = exporter.builder.seen_csv.borrow().clone().unwrap();
        assert_eq!(text, "x,y,z\n1,0,0\n0,2,0\n");
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_failed_build_records_nothing() {
        let dir = TempDir::new().unwrap();
        let exporter = setup(&dir, true);

        assert!(matches!(exporter.export_latest(3), Err(Error::ExternalTool { .. })));
        assert!(exporter.store.map_artifacts().unwrap().is_empty());
        let (csv_path, _) = exporter.builder.seen_csv.borrow().clone().unwrap();
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_no_points_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ScanStore::open(dir.path().join("empty.db")).unwrap();
        store.store_raw_scan(&[1.0], 1, 1).unwrap();
        let builder = FakeBuilder {
            fail: false,
            seen_csv: RefCell::new(None),
        };
        let exporter = MapExporter::new(store, builder, &OctomapSection::default());
        assert!(matches!(exporter.export_latest(3), Err(Error::InvalidParameter(_))));
        assert!(exporter.builder.seen_csv.borrow().is_none());
    }
}
