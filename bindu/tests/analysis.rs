//! Analysis integration tests against the built-in catalog.

mod common;

use approx::assert_relative_eq;
use bindu::analysis::{QueryOutcome, Summary};
use bindu::{AnalysisEngine, Error, Point3, QueryCatalog};
use tempfile::TempDir;

use common::{flat, scan_with_points, test_store};

fn builtin_engine(dir: &TempDir) -> AnalysisEngine {
    AnalysisEngine::new(test_store(dir), QueryCatalog::builtin().unwrap())
}

// ============================================================================
// Density
// ============================================================================

#[test]
fn test_density_buckets_latest_scan() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);
    let store = test_store(&dir);

    scan_with_points(&store, 1, 1, &flat(&[(5.5, 5.5)]));
    let latest = scan_with_points(&store, 1, 3, &flat(&[(0.2, 0.3), (0.7, 0.1), (1.5, 1.2)]));

    match engine.summarize(5).unwrap() {
        Summary::Density(grid) => {
            assert_eq!(grid.scan_id, latest);
            assert_eq!(grid.x_buckets, vec![0, 1]);
            assert_eq!(grid.y_buckets, vec![0, 1]);
            assert_eq!(grid.count_at(0, 0), 2);
            assert_eq!(grid.count_at(1, 1), 1);
            assert_eq!(grid.count_at(0, 1), 0);
            assert_eq!(grid.count_at(5, 5), 0);
            assert_eq!(grid.total(), 3);
        }
        other => panic!("expected density grid, got {:?}", other),
    }

    let svg = engine.render(5).unwrap();
    assert!(svg.contains(&format!("Scan ID: {}", latest)));
}

// ============================================================================
// Empty results
// ============================================================================

#[test]
fn test_empty_store_signals_empty() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);

    match engine.execute(1).unwrap() {
        QueryOutcome::Empty { columns } => {
            assert!(columns.iter().any(|c| c == "scan_id"));
        }
        other => panic!("expected empty outcome, got {:?}", other),
    }
    assert!(engine.summarize(5).unwrap().is_empty());
    assert!(engine.render(5).unwrap().contains("No data available"));
}

#[test]
fn test_scan_without_points_is_not_in_point_stats() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);
    let store = test_store(&dir);
    store.store_raw_scan(&[1.0, 2.0], 1, 2).unwrap();

    assert!(matches!(engine.summarize(1).unwrap(), Summary::ScanInventory(rows) if rows.len() == 1));
    assert!(engine.summarize(2).unwrap().is_empty());
}

// ============================================================================
// Shaped summaries
// ============================================================================

#[test]
fn test_quality_and_histogram() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);
    let store = test_store(&dir);
    let id = scan_with_points(
        &store,
        1,
        3,
        &[
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 12.0),
        ],
    );

    match engine.summarize(6).unwrap() {
        Summary::Quality(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].scan_id, id);
            assert_eq!(rows[0].total_points, 3);
            assert_relative_eq!(rows[0].max_distance, 12.0, max_relative = 1e-12);
            assert_relative_eq!(rows[0].avg_distance, 6.0, max_relative = 1e-12);
            assert_relative_eq!(rows[0].rms_distance, (170.0f64 / 3.0).sqrt(), max_relative = 1e-12);
        }
        other => panic!("expected quality metrics, got {:?}", other),
    }

    match engine.summarize(8).unwrap() {
        Summary::DistanceHistogram(bins) => {
            let mut got: Vec<(String, u64)> = bins.into_iter().map(|b| (b.category, b.point_count)).collect();
            got.sort();
            assert_eq!(
                got,
                vec![("far".to_string(), 2), ("near".to_string(), 1)]
            );
        }
        other => panic!("expected histogram, got {:?}", other),
    }
}

#[test]
fn test_point_statistics_and_temporal() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);
    let store = test_store(&dir);
    scan_with_points(&store, 1, 2, &flat(&[(-1.0, 2.0), (3.0, 4.0)]));
    scan_with_points(&store, 2, 2, &flat(&[(0.0, 0.0)]));

    match engine.summarize(2).unwrap() {
        Summary::PointStatistics(rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].point_count, 2);
            assert_relative_eq!(rows[0].mean.x, 1.0);
            assert_relative_eq!(rows[0].min.x, -1.0);
            assert_relative_eq!(rows[0].max.y, 4.0);
        }
        other => panic!("expected point statistics, got {:?}", other),
    }

    match engine.summarize(9).unwrap() {
        Summary::Temporal(days) => {
            assert_eq!(days.len(), 1);
            assert_eq!(days[0].scan_date, "2024-05-01");
            assert_eq!(days[0].scans_per_day, 2);
            assert_eq!(days[0].total_points_captured, 6);
        }
        other => panic!("expected temporal summary, got {:?}", other),
    }
}

// ============================================================================
// Batch runs
// ============================================================================

#[test]
fn test_run_all_writes_reports() {
    let dir = TempDir::new().unwrap();
    let engine = builtin_engine(&dir);
    let store = test_store(&dir);
    scan_with_points(&store, 1, 2, &flat(&[(0.5, 0.5), (2.5, 0.5)]));

    let out = dir.path().join("analysis_output");
    let report = engine.run_all(Some(&out)).unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    // No map has been built yet
    assert_eq!(report.empty, vec![3]);
    assert_eq!(report.completed.len(), 8);
    for n in 1..=9 {
        assert!(out.join(format!("query_{}.json", n)).exists());
        assert!(out.join(format!("query_{}.svg", n)).exists());
    }
    let json = std::fs::read_to_string(out.join("query_5.json")).unwrap();
    assert!(json.contains("\"shape\": \"density\""));
}

#[test]
fn test_run_all_continues_after_failure() {
    let dir = TempDir::new().unwrap();
    let catalog = QueryCatalog::load(
        "-- 1. Scans\nSELECT scan_id, timestamp, altitude_angle_count, encoder_angle_count FROM raw_scans;\n\
         -- 2. Broken\nSELECT * FROM no_such_table;\n\
         -- 3. Constant\nSELECT 42 AS answer;",
    )
    .unwrap();
    let engine = AnalysisEngine::new(test_store(&dir), catalog).with_render(false);

    let report = engine.run_all(None).unwrap();
    assert_eq!(report.empty, vec![1]);
    assert_eq!(report.completed, vec![3]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], (2, Error::QueryFailed { number: 2, .. })));
}

#[test]
fn test_shape_mismatch_from_custom_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = QueryCatalog::load("-- 5. Not a density query\nSELECT scan_id FROM raw_scans;").unwrap();
    let engine = AnalysisEngine::new(test_store(&dir), catalog);
    let store = test_store(&dir);
    store.store_raw_scan(&[1.0], 1, 1).unwrap();

    match engine.summarize(5) {
        Err(Error::ShapeMismatch { number, column }) => {
            assert_eq!(number, 5);
            assert_eq!(column, "x_bucket");
        }
        other => panic!("expected shape mismatch, got {:?}", other),
    }
}
