//! Typed summaries built from query results.

use std::collections::BTreeSet;

use serde::Serialize;

use super::shape::ResultShape;
use crate::core::types::{Point3, ScanId};
use crate::error::{Error, Result};
use crate::store::{Record, Table};

/// One row of the scan inventory
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanInventoryRow {
    pub scan_id: ScanId,
    pub timestamp: String,
    pub altitude_count: u64,
    pub encoder_count: u64,
}

impl ScanInventoryRow {
    /// Points implied by the scan dimensions
    pub fn total_points(&self) -> u64 {
        self.altitude_count * self.encoder_count
    }
}

/// Per-scan point statistics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointStatistics {
    pub scan_id: ScanId,
    pub timestamp: String,
    pub point_count: u64,
    pub mean: Point3,
    pub min: Point3,
    pub max: Point3,
}

/// Point counts per (x, y) bucket of a single scan.
///
/// `counts[i][j]` is the count for `x_buckets[i]`, `y_buckets[j]`; cells
/// without points are zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DensityGrid {
    pub scan_id: ScanId,
    pub x_buckets: Vec<i64>,
    pub y_buckets: Vec<i64>,
    pub counts: Vec<Vec<u64>>,
}

impl DensityGrid {
    /// Build the grid from density rows, keeping only the highest scan_id
    pub fn from_rows(number: u32, table: &Table) -> Result<Option<Self>> {
        let mut rows = Vec::with_capacity(table.len());
        for record in table.records() {
            rows.push((
                ScanId(int(number, &record, "scan_id")?),
                int(number, &record, "x_bucket")?,
                int(number, &record, "y_bucket")?,
                count(number, &record, "point_density")?,
            ));
        }
        let Some(latest) = rows.iter().map(|r| r.0).max() else {
            return Ok(None);
        };
        rows.retain(|r| r.0 == latest);

        let x_buckets: Vec<i64> = rows.iter().map(|r| r.1).collect::<BTreeSet<_>>().into_iter().collect();
        let y_buckets: Vec<i64> = rows.iter().map(|r| r.2).collect::<BTreeSet<_>>().into_iter().collect();
        let mut counts = vec![vec![0u64; y_buckets.len()]; x_buckets.len()];
        for (_, x, y, n) in rows {
            // Both lookups succeed: the axes were built from these rows.
            if let (Ok(i), Ok(j)) = (x_buckets.binary_search(&x), y_buckets.binary_search(&y)) {
                counts[i][j] += n;
            }
        }

        Ok(Some(Self {
            scan_id: latest,
            x_buckets,
            y_buckets,
            counts,
        }))
    }

    /// Count at a bucket pair, zero if either bucket is absent
    pub fn count_at(&self, x_bucket: i64, y_bucket: i64) -> u64 {
        match (
            self.x_buckets.binary_search(&x_bucket),
            self.y_buckets.binary_search(&y_bucket),
        ) {
            (Ok(i), Ok(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Buckets holding at least one point, as `(x_bucket, y_bucket, count)`
    pub fn nonzero_cells(&self) -> Vec<(i64, i64, u64)> {
        let mut cells = Vec::new();
        for (i, row) in self.counts.iter().enumerate() {
            for (j, &n) in row.iter().enumerate() {
                if n > 0 {
                    cells.push((self.x_buckets[i], self.y_buckets[j], n));
                }
            }
        }
        cells
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Range statistics of one scan
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub scan_id: ScanId,
    pub timestamp: String,
    pub total_points: u64,
    pub max_distance: f64,
    pub avg_distance: f64,
    pub rms_distance: f64,
}

/// Point count of one scan within one range category
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistanceBin {
    pub scan_id: ScanId,
    pub category: String,
    pub point_count: u64,
}

/// Scans captured on one day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyActivity {
    pub scan_date: String,
    pub scans_per_day: u64,
    pub total_points_captured: u64,
}

/// Shaped result of one catalog query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum Summary {
    /// The query produced no rows
    Empty { columns: Vec<String> },
    ScanInventory(Vec<ScanInventoryRow>),
    PointStatistics(Vec<PointStatistics>),
    Density(DensityGrid),
    Quality(Vec<QualityMetrics>),
    DistanceHistogram(Vec<DistanceBin>),
    Temporal(Vec<DailyActivity>),
    Generic(Table),
}

impl Summary {
    /// Shape a non-empty table according to the query number
    pub fn from_table(number: u32, table: Table) -> Result<Self> {
        if table.is_empty() {
            return Ok(Summary::Empty {
                columns: table.columns,
            });
        }
        let shape = ResultShape::for_query(number);
        shape.check(number, &table)?;

        let summary = match shape {
            ResultShape::ScanInventory => Summary::ScanInventory(collect(&table, |r| {
                Ok(ScanInventoryRow {
                    scan_id: ScanId(int(number, r, "scan_id")?),
                    timestamp: text(number, r, "timestamp")?,
                    altitude_count: count(number, r, "altitude_angle_count")?,
                    encoder_count: count(number, r, "encoder_angle_count")?,
                })
            })?),
            ResultShape::PointStatistics => Summary::PointStatistics(collect(&table, |r| {
                Ok(PointStatistics {
                    scan_id: ScanId(int(number, r, "scan_id")?),
                    timestamp: text(number, r, "timestamp")?,
                    point_count: count(number, r, "point_count")?,
                    mean: point(number, r, ["avg_x", "avg_y", "avg_z"])?,
                    min: point(number, r, ["min_x", "min_y", "min_z"])?,
                    max: point(number, r, ["max_x", "max_y", "max_z"])?,
                })
            })?),
            ResultShape::DensityGrid => match DensityGrid::from_rows(number, &table)? {
                Some(grid) => Summary::Density(grid),
                None => Summary::Empty {
                    columns: table.columns,
                },
            },
            ResultShape::QualityMetrics => Summary::Quality(collect(&table, |r| {
                let mean_square = real(number, r, "mean_square_distance")?;
                Ok(QualityMetrics {
                    scan_id: ScanId(int(number, r, "scan_id")?),
                    timestamp: text(number, r, "timestamp")?,
                    total_points: count(number, r, "total_points")?,
                    max_distance: real(number, r, "max_distance")?,
                    avg_distance: real(number, r, "avg_distance")?,
                    rms_distance: mean_square.max(0.0).sqrt(),
                })
            })?),
            ResultShape::DistanceHistogram => Summary::DistanceHistogram(collect(&table, |r| {
                Ok(DistanceBin {
                    scan_id: ScanId(int(number, r, "scan_id")?),
                    category: text(number, r, "distance_category")?,
                    point_count: count(number, r, "point_count")?,
                })
            })?),
            ResultShape::Temporal => Summary::Temporal(collect(&table, |r| {
                Ok(DailyActivity {
                    scan_date: text(number, r, "scan_date")?,
                    scans_per_day: count(number, r, "scans_per_day")?,
                    total_points_captured: count(number, r, "total_points_captured")?,
                })
            })?),
            ResultShape::Generic => Summary::Generic(table),
        };
        Ok(summary)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Summary::Empty { .. })
    }

    /// Labelled values for a bar chart, with the value axis name
    pub fn bars(&self) -> (String, Vec<(String, f64)>) {
        match self {
            Summary::Empty { .. } => (String::new(), Vec::new()),
            Summary::ScanInventory(rows) => (
                "Total Points".to_string(),
                rows.iter()
                    .map(|r| (format!("scan {}", r.scan_id), r.total_points() as f64))
                    .collect(),
            ),
            Summary::PointStatistics(rows) => (
                "Point Count".to_string(),
                rows.iter()
                    .map(|r| (format!("scan {}", r.scan_id), r.point_count as f64))
                    .collect(),
            ),
            Summary::Density(grid) => (
                "Point Density".to_string(),
                grid.nonzero_cells()
                    .into_iter()
                    .map(|(x, y, n)| (format!("({}, {})", x, y), n as f64))
                    .collect(),
            ),
            Summary::Quality(rows) => (
                "RMS Distance (m)".to_string(),
                rows.iter()
                    .map(|r| (format!("scan {}", r.scan_id), r.rms_distance))
                    .collect(),
            ),
            Summary::DistanceHistogram(bins) => (
                "Point Count".to_string(),
                bins.iter()
                    .map(|b| (format!("{} {}", b.scan_id, b.category), b.point_count as f64))
                    .collect(),
            ),
            Summary::Temporal(days) => (
                "Scans per Day".to_string(),
                days.iter()
                    .map(|d| (d.scan_date.clone(), d.scans_per_day as f64))
                    .collect(),
            ),
            Summary::Generic(table) => generic_bars(table),
        }
    }
}

/// Last numeric column after the first as values, labelled by the first column.
///
/// A single-column result is plotted against the row index.
fn generic_bars(table: &Table) -> (String, Vec<(String, f64)>) {
    let numeric = |c: usize| table.rows.iter().any(|row| row[c].as_f64().is_some());
    let value_col = match table.columns.len() {
        0 => None,
        1 => Some(0).filter(|&c| numeric(c)),
        n => (1..n).rev().find(|&c| numeric(c)),
    };
    let Some(value_col) = value_col else {
        return (String::new(), Vec::new());
    };
    let bars = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let label = if value_col == 0 {
                i.to_string()
            } else {
                row[0].display()
            };
            (label, row[value_col].as_f64().unwrap_or(0.0))
        })
        .collect();
    (table.columns[value_col].clone(), bars)
}

fn collect<T>(table: &Table, f: impl Fn(&Record<'_>) -> Result<T>) -> Result<Vec<T>> {
    table.records().map(|r| f(&r)).collect()
}

fn mismatch(number: u32, column: &str) -> Error {
    Error::ShapeMismatch {
        number,
        column: column.to_string(),
    }
}

fn int(number: u32, record: &Record<'_>, column: &str) -> Result<i64> {
    record.i64(column).ok_or_else(|| mismatch(number, column))
}

fn count(number: u32, record: &Record<'_>, column: &str) -> Result<u64> {
    int(number, record, column).and_then(|v| u64::try_from(v).map_err(|_| mismatch(number, column)))
}

fn real(number: u32, record: &Record<'_>, column: &str) -> Result<f64> {
    record.f64(column).ok_or_else(|| mismatch(number, column))
}

fn text(number: u32, record: &Record<'_>, column: &str) -> Result<String> {
    record
        .text(column)
        .map(str::to_string)
        .ok_or_else(|| mismatch(number, column))
}

fn point(number: u32, record: &Record<'_>, columns: [&str; 3]) -> Result<Point3> {
    Ok(Point3::new(
        real(number, record, columns[0])?,
        real(number, record, columns[1])?,
        real(number, record, columns[2])?,
    ))
}
