//! SQLite schema and connection setup.

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// Tables for raw scans, derived points and map artifacts.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS raw_scans (
    scan_id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    altitude_angle_count INTEGER NOT NULL,
    encoder_angle_count INTEGER NOT NULL,
    data BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS point_clouds (
    point_id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    timestamp TEXT NOT NULL,
    FOREIGN KEY (scan_id) REFERENCES raw_scans (scan_id)
);

CREATE INDEX IF NOT EXISTS idx_point_clouds_scan ON point_clouds (scan_id);

CREATE TABLE IF NOT EXISTS octomaps (
    map_id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    resolution REAL NOT NULL,
    file_path TEXT NOT NULL,
    point_count INTEGER NOT NULL
);
";

/// Name of the SQL scalar returning the Euclidean norm of (x, y, z).
pub const POINT_RANGE_FN: &str = "point_range";

/// Per-connection pragmas and SQL functions.
pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.create_scalar_function(
        POINT_RANGE_FN,
        3,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let x: f64 = ctx.get(0)?;
            let y: f64 = ctx.get(1)?;
            let z: f64 = ctx.get(2)?;
            Ok((x * x + y * y + z * z).sqrt())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('raw_scans', 'point_clouds', 'octomaps')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_point_range_function() {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn).unwrap();
        let range: f64 = conn
            .query_row("SELECT point_range(2, 3, 6)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(range, 7.0);
    }
}
