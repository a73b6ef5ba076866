//! Tabular query results.

use rusqlite::types::ValueRef;
use serde::Serialize;

/// A single result value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// SQL NULL
    Null,
    /// Integer value
    Integer(i64),
    /// Floating point value
    Real(f64),
    /// Text value
    Text(String),
    /// Blob value
    Blob(Vec<u8>),
}

impl Cell {
    /// Numeric view of integer and real cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; reals are accepted only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            Cell::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Human readable rendering used for labels
    pub fn display(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Integer(v) => v.to_string(),
            Cell::Real(v) => format!("{:.3}", v),
            Cell::Text(s) => s.clone(),
            Cell::Blob(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(v) => Cell::Integer(v),
            ValueRef::Real(v) => Cell::Real(v),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
        }
    }
}

/// Ordered rows with named columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Row values, one entry per column
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate rows as named records
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one row.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Cell],
}

impl<'a> Record<'a> {
    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Numeric value of a named column
    pub fn f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_f64)
    }

    /// Integer value of a named column
    pub fn i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Cell::as_i64)
    }

    /// Text value of a named column
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Cell::as_str)
    }
}
