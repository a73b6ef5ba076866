//! Shared helpers for Bindu integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bindu::{ManualClock, Point3, ScanId, ScanStore};
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

/// Store in `dir` whose clock starts at 2024-05-01 12:00 UTC and advances
/// one minute per timestamp.
pub fn test_store(dir: &TempDir) -> ScanStore {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::stepping(start, Duration::minutes(1)));
    ScanStore::with_clock(dir.path().join("lidar.db"), clock).unwrap()
}

/// Store a raw scan of the given shape and attach explicit points to it.
pub fn scan_with_points(store: &ScanStore, rings: usize, ticks: usize, points: &[Point3]) -> ScanId {
    let id = store.store_raw_scan(&vec![1.0; rings * ticks], rings, ticks).unwrap();
    store.store_point_cloud(id, points).unwrap();
    id
}

/// Flat points at the given (x, y) positions
pub fn flat(xy: &[(f64, f64)]) -> Vec<Point3> {
    xy.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect()
}
