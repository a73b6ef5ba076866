//! Library of numbered analytical queries.
//!
//! A catalog source is plain SQL where each query is introduced by a comment
//! header of the form `-- N. Description`. Further comment lines extend the
//! description, other lines form the query text:
//!
//! ```sql
//! -- 1. Basic Scan Information
//! -- one row per stored scan
//! SELECT scan_id, timestamp FROM raw_scans;
//! ```
//!
//! The catalog is immutable once loaded.

mod parser;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Catalog embedded in the binary
pub const BUILTIN_CATALOG: &str = include_str!("../../queries/lidar_analysis.sql");

/// One numbered query with its description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalyticalQuery {
    /// Dispatch key for result shaping
    pub number: u32,
    /// Human readable description
    pub description: String,
    /// SQL text
    pub query_text: String,
}

/// Parsed, read-only set of queries.
#[derive(Clone, Debug)]
pub struct QueryCatalog {
    queries: BTreeMap<u32, AnalyticalQuery>,
}

impl QueryCatalog {
    /// Parse catalog text
    pub fn load(source: &str) -> Result<Self> {
        let queries = parser::parse(source);
        if queries.is_empty() {
            return Err(Error::CatalogParse(
                "source contains no numbered query with a body".to_string(),
            ));
        }
        log::info!("Catalog: loaded {} queries", queries.len());
        Ok(Self { queries })
    }

    /// Parse a catalog file
    pub fn load_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::CatalogParse(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::load(&source)
    }

    /// The embedded catalog
    pub fn builtin() -> Result<Self> {
        Self::load(BUILTIN_CATALOG)
    }

    /// Look up a query by number
    pub fn get(&self, number: u32) -> Option<&AnalyticalQuery> {
        self.queries.get(&number)
    }

    /// Query numbers in ascending order
    pub fn numbers(&self) -> Vec<u32> {
        self.queries.keys().copied().collect()
    }

    /// Queries in ascending number order
    pub fn iter(&self) -> impl Iterator<Item = &AnalyticalQuery> {
        self.queries.values()
    }

    /// Number of queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the catalog holds no queries
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_continuation() {
        let source = "-- 1. Basic Info\nSELECT * FROM raw_scans;\n-- continued description\n-- 2. Other\nSELECT 1;";
        let catalog = QueryCatalog::load(source).unwrap();

        assert_eq!(catalog.len(), 2);
        let first = catalog.get(1).unwrap();
        assert_eq!(first.description, "Basic Info continued description");
        assert_eq!(first.query_text, "SELECT * FROM raw_scans;");
        assert_eq!(catalog.get(2).unwrap().query_text, "SELECT 1;");
    }

    #[test]
    fn test_empty_sources_fail() {
        for source in ["", "   \n\n", "-- just a comment\n-- another", "-- 1. No body\n"] {
            assert!(
                matches!(QueryCatalog::load(source), Err(Error::CatalogParse(_))),
                "source {:?} should not parse",
                source
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let result = QueryCatalog::load_file(Path::new("/nonexistent/queries.sql"));
        assert!(matches!(result, Err(Error::CatalogParse(_))));
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = QueryCatalog::builtin().unwrap();
        assert_eq!(catalog.numbers(), (1..=9).collect::<Vec<u32>>());
        assert!(catalog.iter().all(|q| !q.description.is_empty()));
        assert_eq!(catalog.get(5).unwrap().description, "Point Distribution Analysis");
    }
}
