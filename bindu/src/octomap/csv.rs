//! Points CSV consumed by the map builder.
//!
//! Header `x,y,z`, one point per line, shortest decimal form that round-trips.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::types::Point3;
use crate::error::Result;

/// Header line of the points CSV
pub const CSV_HEADER: &str = "x,y,z";

/// Write points as CSV to any writer
pub fn write_points<W: Write>(writer: &mut W, points: &[Point3]) -> std::io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for p in points {
        writeln!(writer, "{},{},{}", p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Write points to a CSV file, returning the number of points written
pub fn write_points_csv(path: &Path, points: &[Point3]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_points(&mut writer, points)?;
    writer.flush()?;
    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format() {
        let mut out = Vec::new();
        write_points(&mut out, &[Point3::new(1.0, -2.5, 0.125), Point3::new(0.0, 0.0, -0.0)]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x,y,z\n1,-2.5,0.125\n0,0,-0\n");
    }

    #[test]
    fn test_values_roundtrip_through_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("points.csv");
        let points = vec![Point3::new(0.1 + 0.2, 1e-12, -123456.789)];

        assert_eq!(write_points_csv(&path, &points).unwrap(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        let line = text.lines().nth(1).unwrap();
        let parsed: Vec<f64> = line.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(parsed, vec![points[0].x, points[0].y, points[0].z]);
    }

    #[test]
    fn test_empty_has_header_only() {
        let mut out = Vec::new();
        write_points(&mut out, &[]).unwrap();
        assert_eq!(out, b"x,y,z\n");
    }
}
