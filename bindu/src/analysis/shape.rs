//! Result shapes keyed by catalog number.

use crate::error::{Error, Result};
use crate::store::Table;

/// Expected layout of a query result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultShape {
    /// Query 1
    ScanInventory,
    /// Query 2
    PointStatistics,
    /// Query 5
    DensityGrid,
    /// Query 6
    QualityMetrics,
    /// Query 8
    DistanceHistogram,
    /// Query 9
    Temporal,
    /// Anything else
    Generic,
}

impl ResultShape {
    /// Shape documented for a catalog number
    pub fn for_query(number: u32) -> Self {
        match number {
            1 => ResultShape::ScanInventory,
            2 => ResultShape::PointStatistics,
            5 => ResultShape::DensityGrid,
            6 => ResultShape::QualityMetrics,
            8 => ResultShape::DistanceHistogram,
            9 => ResultShape::Temporal,
            _ => ResultShape::Generic,
        }
    }

    /// Columns the result must contain
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            ResultShape::ScanInventory => &[
                "scan_id",
                "timestamp",
                "altitude_angle_count",
                "encoder_angle_count",
            ],
            ResultShape::PointStatistics => &[
                "scan_id",
                "timestamp",
                "point_count",
                "avg_x",
                "avg_y",
                "avg_z",
                "min_x",
                "max_x",
                "min_y",
                "max_y",
                "min_z",
                "max_z",
            ],
            ResultShape::DensityGrid => &["scan_id", "x_bucket", "y_bucket", "point_density"],
            ResultShape::QualityMetrics => &[
                "scan_id",
                "timestamp",
                "total_points",
                "max_distance",
                "avg_distance",
                "mean_square_distance",
            ],
            ResultShape::DistanceHistogram => &["scan_id", "distance_category", "point_count"],
            ResultShape::Temporal => &["scan_date", "scans_per_day", "total_points_captured"],
            ResultShape::Generic => &[],
        }
    }

    /// Fail with the first required column the table lacks
    pub fn check(self, number: u32, table: &Table) -> Result<()> {
        match self
            .required_columns()
            .iter()
            .find(|column| table.column_index(column).is_none())
        {
            Some(column) => Err(Error::ShapeMismatch {
                number,
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        assert_eq!(ResultShape::for_query(5), ResultShape::DensityGrid);
        assert_eq!(ResultShape::for_query(3), ResultShape::Generic);
        assert_eq!(ResultShape::for_query(42), ResultShape::Generic);
    }

    #[test]
    fn test_check_reports_missing_column() {
        let table = Table::new(
            vec!["scan_id".into(), "x_bucket".into(), "point_density".into()],
            Vec::new(),
        );
        match ResultShape::DensityGrid.check(5, &table) {
            Err(Error::ShapeMismatch { number, column }) => {
                assert_eq!(number, 5);
                assert_eq!(column, "y_bucket");
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
        assert!(ResultShape::Generic.check(3, &table).is_ok());
    }
}
