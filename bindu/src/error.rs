//! Error types for Bindu

use crate::core::types::ScanId;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bindu error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Scan shape or payload does not match its declared dimensions
    #[error("Schema error: {0}")]
    Schema(String),

    /// Write referencing a scan that does not exist
    #[error("Referential error: scan {scan_id} does not exist ({operation})")]
    Referential {
        /// Referenced scan
        scan_id: ScanId,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Query catalog source contained no usable query
    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    /// External map builder did not complete successfully
    #[error("Map builder `{tool}` failed ({status}){}", format_stderr(.stderr))]
    ExternalTool {
        /// Program that was invoked
        tool: String,
        /// Exit status, spawn failure or timeout description
        status: String,
        /// Captured standard error of the builder
        stderr: String,
    },

    /// Query number not present in the catalog
    #[error("Query {0} not found in catalog")]
    UnknownQuery(u32),

    /// Catalog query failed to execute
    #[error("Query {number} failed: {source}")]
    QueryFailed {
        /// Catalog number of the query
        number: u32,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// Query result lacks a column its shape requires, or holds the wrong type there
    #[error("Query {number} result has no usable column `{column}`")]
    ShapeMismatch {
        /// Catalog number of the query
        number: u32,
        /// Missing column name
        column: String,
    },

    /// SQLite failure during a store operation
    #[error("Storage error during {operation}: {source}")]
    Storage {
        /// Store operation that failed
        operation: &'static str,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Scan fixture could not be encoded or decoded
    #[error("Fixture encoding error: {0}")]
    Fixture(#[from] postcard::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Chart rendering failed
    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),
}

impl Error {
    /// Adapter for `map_err` that tags a SQLite error with the store operation.
    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
        move |source| Error::Storage { operation, source }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message_includes_stderr() {
        let err = Error::ExternalTool {
            tool: "octomap-builder".to_string(),
            status: "exit status: 2".to_string(),
            stderr: "could not open file\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Map builder `octomap-builder` failed (exit status: 2): could not open file"
        );
    }

    #[test]
    fn test_external_tool_message_without_stderr() {
        let err = Error::ExternalTool {
            tool: "builder".to_string(),
            status: "timed out after 1s".to_string(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Map builder `builder` failed (timed out after 1s)");
    }

    #[test]
    fn test_referential_message_names_scan() {
        let err = Error::Referential {
            scan_id: ScanId(42),
            operation: "store_point_cloud",
        };
        assert!(err.to_string().contains("scan 42"));
        assert!(err.to_string().contains("store_point_cloud"));
    }
}
