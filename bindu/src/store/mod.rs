//! Persistent repository for raw scans, point clouds and map artifacts.
//!
//! The store is backed by a single SQLite file. Every public operation opens
//! its own connection, performs its work (inside one transaction when it
//! writes) and drops the connection before returning. There is no pooling
//! and no state shared between calls apart from the database file itself.
//!
//! ## Tables
//!
//! | Table | Contents |
//! |-------|----------|
//! | `raw_scans` | Dimensions and little-endian `f64` blob of each scan |
//! | `point_clouds` | One row per Cartesian point, keyed by `scan_id` |
//! | `octomaps` | Metadata of completed external map builds |
//!
//! ## Ingestion in progress
//!
//! Raw scans and their points are written by separate calls. A scan that
//! exists without points is still being ingested, not an empty scan.
//!
//! ```rust,ignore
//! use bindu::store::ScanStore;
//!
//! let store = ScanStore::open("lidar_data.db")?;
//! let scan_id = store.store_raw_scan(grid.as_slice(), grid.rings(), grid.ticks())?;
//! store.store_point_cloud(scan_id, &points)?;
//! let latest = store.latest_scans(10)?;
//! ```

pub mod clock;
pub mod codec;
pub mod schema;
pub mod table;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};

use crate::core::types::{MapArtifact, MapId, Point3, ScanGrid, ScanId, ScanSummary, check_dimensions};
use crate::error::{Error, Result};

pub use clock::{Clock, ManualClock, SystemClock, format_timestamp};
pub use table::{Cell, Record, Table};

/// Operation name attached to analytical query failures
pub const QUERY_OP: &str = "query";

/// Default SQLite busy timeout
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// SQLite-backed scan repository.
#[derive(Clone)]
pub struct ScanStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    busy_timeout: Duration,
}

impl std::fmt::Debug for ScanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanStore")
            .field("path", &self.path)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

impl ScanStore {
    /// Open (and create if needed) a store using wall-clock timestamps
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    /// Open a store with an explicit time source
    pub fn with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            clock,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Override the SQLite busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Database file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(Error::storage("open"))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(Error::storage("open"))?;
        schema::configure(&conn).map_err(Error::storage("open"))?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(Error::storage("init_schema"))?;
        log::debug!("Store: schema ready at {}", self.path.display());
        Ok(())
    }

    /// Store one raw scan and return its new key.
    ///
    /// `data` is row-major and must hold exactly
    /// `altitude_count × encoder_count` samples.
    pub fn store_raw_scan(
        &self,
        data: &[f64],
        altitude_count: usize,
        encoder_count: usize,
    ) -> Result<ScanId> {
        check_dimensions(data.len(), altitude_count, encoder_count)?;
        let blob = codec::encode_samples(data);
        let timestamp = format_timestamp(self.clock.now());

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO raw_scans (timestamp, altitude_angle_count, encoder_angle_count, data)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                timestamp,
                to_sql_count(altitude_count)?,
                to_sql_count(encoder_count)?,
                blob
            ],
        )
        .map_err(Error::storage("store_raw_scan"))?;
        let scan_id = ScanId(conn.last_insert_rowid());

        log::debug!(
            "Store: raw scan {} ({}x{}) at {}",
            scan_id,
            altitude_count,
            encoder_count,
            timestamp
        );
        Ok(scan_id)
    }

    /// Store the point cloud of a scan as one batch.
    ///
    /// Any points previously stored for the scan are replaced in the same
    /// transaction, so readers see either the old or the new set.
    pub fn store_point_cloud(&self, scan_id: ScanId, points: &[Point3]) -> Result<usize> {
        const OP: &str = "store_point_cloud";
        let timestamp = format_timestamp(self.clock.now());

        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(Error::storage(OP))?;

        if !scan_exists(&tx, scan_id).map_err(Error::storage(OP))? {
            return Err(Error::Referential {
                scan_id,
                operation: OP,
            });
        }

        let replaced = tx
            .execute("DELETE FROM point_clouds WHERE scan_id = ?1", [scan_id.0])
            .map_err(Error::storage(OP))?;
        if replaced > 0 {
            log::warn!(
                "Store: replacing {} existing points of scan {}",
                replaced,
                scan_id
            );
        }

        {
            let mut insert = tx
                .prepare_cached(
                    "INSERT INTO point_clouds (scan_id, x, y, z, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(Error::storage(OP))?;
            for p in points {
                insert
                    .execute(params![scan_id.0, p.x, p.y, p.z, timestamp])
                    .map_err(Error::storage(OP))?;
            }
        }

        tx.commit().map_err(Error::storage(OP))?;
        log::debug!("Store: {} points for scan {}", points.len(), scan_id);
        Ok(points.len())
    }

    /// Record a completed external map build
    pub fn store_map_artifact(
        &self,
        resolution: f64,
        file_path: &str,
        point_count: u64,
    ) -> Result<MapId> {
        if !(resolution > 0.0 && resolution.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "map resolution must be positive, got {}",
                resolution
            )));
        }
        let point_count = i64::try_from(point_count).map_err(|_| {
            Error::InvalidParameter(format!("point count {} out of range", point_count))
        })?;
        let timestamp = format_timestamp(self.clock.now());

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO octomaps (timestamp, resolution, file_path, point_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![timestamp, resolution, file_path, point_count],
        )
        .map_err(Error::storage("store_map_artifact"))?;
        Ok(MapId(conn.last_insert_rowid()))
    }

    /// Remove a scan together with its points.
    ///
    /// Returns `false` when no such scan exists.
    pub fn delete_scan(&self, scan_id: ScanId) -> Result<bool> {
        const OP: &str = "delete_scan";
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(Error::storage(OP))?;
        tx.execute("DELETE FROM point_clouds WHERE scan_id = ?1", [scan_id.0])
            .map_err(Error::storage(OP))?;
        let removed = tx
            .execute("DELETE FROM raw_scans WHERE scan_id = ?1", [scan_id.0])
            .map_err(Error::storage(OP))?;
        tx.commit().map_err(Error::storage(OP))?;
        if removed > 0 {
            log::debug!("Store: deleted scan {}", scan_id);
        }
        Ok(removed > 0)
    }

    /// Most recent scans first, at most `limit`
    pub fn latest_scans(&self, limit: usize) -> Result<Vec<ScanSummary>> {
        const OP: &str = "latest_scans";
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT scan_id, timestamp, altitude_angle_count, encoder_angle_count
                 FROM raw_scans
                 ORDER BY timestamp DESC, scan_id DESC
                 LIMIT ?1",
            )
            .map_err(Error::storage(OP))?;
        let rows = stmt
            .query_map([limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(Error::storage(OP))?;

        let mut scans = Vec::new();
        for row in rows {
            let (scan_id, timestamp, altitude, encoder) = row.map_err(Error::storage(OP))?;
            scans.push(ScanSummary {
                scan_id: ScanId(scan_id),
                timestamp,
                altitude_count: from_sql_count(altitude)?,
                encoder_count: from_sql_count(encoder)?,
            });
        }
        Ok(scans)
    }

    /// Points of a scan in insertion order.
    ///
    /// `None` if the scan does not exist; an empty vector if its points have
    /// not been stored yet.
    pub fn points_for_scan(&self, scan_id: ScanId) -> Result<Option<Vec<Point3>>> {
        const OP: &str = "points_for_scan";
        let conn = self.connect()?;
        if !scan_exists(&conn, scan_id).map_err(Error::storage(OP))? {
            return Ok(None);
        }
        let mut stmt = conn
            .prepare("SELECT x, y, z FROM point_clouds WHERE scan_id = ?1 ORDER BY point_id")
            .map_err(Error::storage(OP))?;
        let points = stmt
            .query_map([scan_id.0], |row| {
                Ok(Point3::new(row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(Error::storage(OP))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::storage(OP))?;
        Ok(Some(points))
    }

    /// Decode the stored raw samples of a scan
    pub fn raw_scan_payload(&self, scan_id: ScanId) -> Result<Option<ScanGrid>> {
        const OP: &str = "raw_scan_payload";
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT data, altitude_angle_count, encoder_angle_count
                 FROM raw_scans WHERE scan_id = ?1",
                [scan_id.0],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(Error::storage(OP))?;

        match row {
            Some((blob, rings, ticks)) => {
                let grid = codec::decode_grid(&blob, from_sql_count(rings)?, from_sql_count(ticks)?)
                    .map_err(|e| Error::Schema(format!("scan {}: {}", scan_id, e)))?;
                Ok(Some(grid))
            }
            None => Ok(None),
        }
    }

    /// Look up one map artifact
    pub fn map_artifact(&self, map_id: MapId) -> Result<Option<MapArtifact>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT map_id, timestamp, resolution, file_path, point_count
             FROM octomaps WHERE map_id = ?1",
            [map_id.0],
            map_artifact_row,
        )
        .optional()
        .map_err(Error::storage("map_artifact"))
    }

    /// All map artifacts, newest first
    pub fn map_artifacts(&self) -> Result<Vec<MapArtifact>> {
        const OP: &str = "map_artifacts";
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT map_id, timestamp, resolution, file_path, point_count
                 FROM octomaps ORDER BY timestamp DESC, map_id DESC",
            )
            .map_err(Error::storage(OP))?;
        let artifacts = stmt
            .query_map([], map_artifact_row)
            .map_err(Error::storage(OP))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::storage(OP))?;
        Ok(artifacts)
    }

    /// Number of stored raw scans
    pub fn scan_count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM raw_scans", [], |row| row.get(0))
            .map_err(Error::storage("scan_count"))?;
        from_sql_count(count)
    }

    /// Run a read-only analytical query.
    ///
    /// Statements that would modify the database are rejected.
    pub fn query(&self, sql: &str) -> Result<Table> {
        let conn = self.connect()?;
        run_query(&conn, sql).map_err(Error::storage(QUERY_OP))
    }
}

fn run_query(conn: &Connection, sql: &str) -> rusqlite::Result<Table> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(rusqlite::Error::InvalidQuery);
    }
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(Cell::from(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(Table::new(columns, out))
}

fn scan_exists(conn: &Connection, scan_id: ScanId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM raw_scans WHERE scan_id = ?1",
        [scan_id.0],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

fn map_artifact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MapArtifact> {
    let point_count: i64 = row.get(4)?;
    Ok(MapArtifact {
        map_id: MapId(row.get(0)?),
        timestamp: row.get(1)?,
        resolution: row.get(2)?,
        file_path: row.get(3)?,
        point_count: u64::try_from(point_count).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Integer, Box::new(e))
        })?,
    })
}

fn to_sql_count(count: usize) -> Result<i64> {
    i64::try_from(count).map_err(|_| Error::Schema(format!("dimension {} out of range", count)))
}

fn from_sql_count(count: i64) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::Schema(format!("stored count {} is negative", count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> ScanStore {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::stepping(start, ChronoDuration::seconds(1)));
        ScanStore::with_clock(dir.path().join("lidar.db"), clock).unwrap()
    }

    fn ramp(rings: usize, ticks: usize) -> ScanGrid {
        let data = (0..rings * ticks).map(|i| i as f64 * 0.125 + 0.5).collect();
        ScanGrid::new(rings, ticks, data).unwrap()
    }

    #[test]
    fn test_raw_scan_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        for (rings, ticks) in [(1, 1), (1, 7), (5, 1), (3, 4), (32, 512)] {
            let grid = ramp(rings, ticks);
            let id = store.store_raw_scan(grid.as_slice(), rings, ticks).unwrap();
            let loaded = store.raw_scan_payload(id).unwrap().unwrap();
            assert_eq!(loaded.rings(), rings);
            assert_eq!(loaded.ticks(), ticks);
            assert_eq!(loaded, grid);
        }
    }

    #[test]
    fn test_raw_scan_shape_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let result = store.store_raw_scan(&[1.0, 2.0, 3.0], 2, 2);
        assert!(matches!(result, Err(Error::Schema(_))));
        assert_eq!(store.scan_count().unwrap(), 0);
    }

    #[test]
    fn test_points_absent_until_stored() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.store_raw_scan(&[1.0, 2.0], 1, 2).unwrap();
        assert_eq!(store.points_for_scan(id).unwrap(), Some(Vec::new()));
        assert_eq!(store.points_for_scan(ScanId(999)).unwrap(), None);
    }

    #[test]
    fn test_point_cloud_unknown_scan() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let result = store.store_point_cloud(ScanId(7), &[Point3::new(1.0, 2.0, 3.0)]);
        match result {
            Err(Error::Referential { scan_id, .. }) => assert_eq!(scan_id, ScanId(7)),
            other => panic!("expected referential error, got {:?}", other),
        }
    }

    #[test]
    fn test_point_cloud_replaced_on_restore() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let id = store.store_raw_scan(&[1.0, 2.0], 1, 2).unwrap();

        let first = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        store.store_point_cloud(id, &first).unwrap();
        let second = vec![Point3::new(0.0, 3.0, 0.0)];
        store.store_point_cloud(id, &second).unwrap();

        assert_eq!(store.points_for_scan(id).unwrap(), Some(second));
    }

    #[test]
    fn test_points_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let id = store.store_raw_scan(&[1.0; 4], 2, 2).unwrap();

        let points: Vec<Point3> = (0..4).map(|i| Point3::new(i as f64, -(i as f64), 0.5)).collect();
        assert_eq!(store.store_point_cloud(id, &points).unwrap(), 4);
        assert_eq!(store.points_for_scan(id).unwrap().unwrap(), points);
    }

    #[test]
    fn test_latest_scans_order_and_limit() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let ids: Vec<ScanId> = (0..4)
            .map(|_| store.store_raw_scan(&[1.0; 6], 2, 3).unwrap())
            .collect();

        let latest = store.latest_scans(3).unwrap();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].scan_id, ids[3]);
        assert_eq!(latest[1].scan_id, ids[2]);
        assert_eq!(latest[2].scan_id, ids[1]);
        assert!(latest[0].timestamp > latest[1].timestamp);
        assert_eq!(latest[0].altitude_count, 2);
        assert_eq!(latest[0].encoder_count, 3);
        assert_eq!(latest[0].expected_points(), 6);
    }

    #[test]
    fn test_latest_scans_prefers_timestamp_over_id() {
        let dir = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = ScanStore::with_clock(dir.path().join("lidar.db"), clock.clone()).unwrap();

        let newer = store.store_raw_scan(&[1.0], 1, 1).unwrap();
        clock.set(start - ChronoDuration::hours(1));
        let older = store.store_raw_scan(&[1.0], 1, 1).unwrap();

        let latest = store.latest_scans(10).unwrap();
        assert_eq!(latest[0].scan_id, newer);
        assert_eq!(latest[1].scan_id, older);
        assert_eq!(latest[0].timestamp, "2024-05-01T12:00:00.000000Z");
    }

    #[test]
    fn test_map_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let id = store.store_map_artifact(0.1, "out.bt", 1234).unwrap();
        let artifact = store.map_artifact(id).unwrap().unwrap();
        assert_eq!(artifact.resolution, 0.1);
        assert_eq!(artifact.file_path, "out.bt");
        assert_eq!(artifact.point_count, 1234);
        assert_eq!(store.map_artifact(MapId(99)).unwrap(), None);

        assert!(matches!(
            store.store_map_artifact(0.0, "out.bt", 1),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(store.map_artifacts().unwrap().len(), 1);
    }

    #[test]
    fn test_negative_map_point_count_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let id = store.store_map_artifact(0.1, "out.bt", 5).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute("UPDATE octomaps SET point_count = -3 WHERE map_id = ?1", [id.0])
            .unwrap();

        assert!(matches!(store.map_artifact(id), Err(Error::Storage { .. })));
        assert!(matches!(store.map_artifacts(), Err(Error::Storage { .. })));
    }

    #[test]
    fn test_delete_scan_removes_points() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let id = store.store_raw_scan(&[1.0, 2.0], 1, 2).unwrap();
        store
            .store_point_cloud(id, &[Point3::new(1.0, 0.0, 0.0)])
            .unwrap();

        assert!(store.delete_scan(id).unwrap());
        assert_eq!(store.points_for_scan(id).unwrap(), None);
        assert_eq!(store.scan_count().unwrap(), 0);
        assert!(!store.delete_scan(id).unwrap());
    }

    #[test]
    fn test_query_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let result = store.query("DELETE FROM raw_scans");
        assert!(matches!(result, Err(Error::Storage { operation: QUERY_OP, .. })));

        let table = store.query("SELECT COUNT(*) AS n FROM raw_scans").unwrap();
        assert_eq!(table.columns, vec!["n".to_string()]);
        assert_eq!(table.rows[0][0], Cell::Integer(0));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = test_store(&dir);
            store.store_raw_scan(&[2.0, 4.0], 2, 1).unwrap()
        };
        let store = ScanStore::open(dir.path().join("lidar.db")).unwrap();
        assert!(store.raw_scan_payload(id).unwrap().is_some());
    }
}
