//! Query execution, summarization and rendering.
//!
//! The engine runs catalog queries against a [`ScanStore`] and shapes each
//! result according to its catalog number:
//!
//! | # | Summary |
//! |---|---------|
//! | 1 | [`Summary::ScanInventory`] |
//! | 2 | [`Summary::PointStatistics`] |
//! | 5 | [`Summary::Density`] (latest scan only) |
//! | 6 | [`Summary::Quality`] |
//! | 8 | [`Summary::DistanceHistogram`] |
//! | 9 | [`Summary::Temporal`] |
//! | other | [`Summary::Generic`] |
//!
//! A query with zero rows yields [`QueryOutcome::Empty`] / [`Summary::Empty`],
//! never an error.

pub mod shape;
pub mod summary;
pub mod svg;

use std::fs;
use std::path::Path;

use crate::catalog::QueryCatalog;
use crate::error::{Error, Result};
use crate::store::{QUERY_OP, ScanStore, Table};

pub use shape::ResultShape;
pub use summary::{
    DailyActivity, DensityGrid, DistanceBin, PointStatistics, QualityMetrics, ScanInventoryRow,
    Summary,
};
pub use svg::ChartConfig;

/// Raw result of one query
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    /// Zero rows; the column names are still reported
    Empty { columns: Vec<String> },
    Rows(Table),
}

impl QueryOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryOutcome::Empty { .. })
    }
}

/// Result of [`AnalysisEngine::run_all`]
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Queries that produced rows
    pub completed: Vec<u32>,
    /// Queries that produced no rows
    pub empty: Vec<u32>,
    /// Queries that failed, with the cause
    pub failures: Vec<(u32, Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs catalog queries against a store.
pub struct AnalysisEngine {
    store: ScanStore,
    catalog: QueryCatalog,
    chart: ChartConfig,
    render_charts: bool,
}

impl AnalysisEngine {
    /// Engine with default chart settings and rendering enabled
    pub fn new(store: ScanStore, catalog: QueryCatalog) -> Self {
        Self {
            store,
            catalog,
            chart: ChartConfig::default(),
            render_charts: true,
        }
    }

    /// Skip SVG output in [`run_all`](Self::run_all)
    pub fn with_render(mut self, enabled: bool) -> Self {
        self.render_charts = enabled;
        self
    }

    /// Override chart dimensions and colors
    pub fn with_chart_config(mut self, chart: ChartConfig) -> Self {
        self.chart = chart;
        self
    }

    /// Queries this engine runs
    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    /// Execute one query
    pub fn execute(&self, number: u32) -> Result<QueryOutcome> {
        let query = self.catalog.get(number).ok_or(Error::UnknownQuery(number))?;
        let table = self.store.query(&query.query_text).map_err(|e| match e {
            Error::Storage {
                operation: QUERY_OP,
                source,
            } => Error::QueryFailed { number, source },
            other => other,
        })?;

        log::debug!("Analysis: query {} returned {} rows", number, table.len());
        if table.is_empty() {
            Ok(QueryOutcome::Empty {
                columns: table.columns,
            })
        } else {
            Ok(QueryOutcome::Rows(table))
        }
    }

    /// Execute one query and shape its result
    pub fn summarize(&self, number: u32) -> Result<Summary> {
        match self.execute(number)? {
            QueryOutcome::Empty { columns } => Ok(Summary::Empty { columns }),
            QueryOutcome::Rows(table) => Summary::from_table(number, table),
        }
    }

    /// Execute one query and render its summary as SVG
    pub fn render(&self, number: u32) -> Result<String> {
        let summary = self.summarize(number)?;
        self.render_summary(number, &summary)
    }

    fn render_summary(&self, number: u32, summary: &Summary) -> Result<String> {
        let title = match (summary, self.catalog.get(number)) {
            (Summary::Density(grid), _) => {
                format!("Point Distribution Analysis (Scan ID: {})", grid.scan_id)
            }
            (_, Some(query)) => format!("Query {}: {}", number, query.description),
            (_, None) => format!("Query {}", number),
        };
        let mut svg = String::new();
        svg::render_summary(&mut svg, &self.chart, &title, summary)?;
        Ok(svg)
    }

    /// Run every query in number order.
    ///
    /// With an output directory, writes `query_{n}.json` (and `query_{n}.svg`
    /// unless rendering is disabled) per query. A failing query is recorded
    /// and the batch continues; only failing to create the directory aborts.
    pub fn run_all(&self, output_dir: Option<&Path>) -> Result<BatchReport> {
        if let Some(dir) = output_dir {
            fs::create_dir_all(dir)?;
        }

        let mut report = BatchReport::default();
        for query in self.catalog.iter() {
            log::info!("Running query {}: {}", query.number, query.description);
            match self.run_one(query.number, output_dir) {
                Ok(true) => report.empty.push(query.number),
                Ok(false) => report.completed.push(query.number),
                Err(e) => {
                    log::warn!("Query {} failed: {}", query.number, e);
                    report.failures.push((query.number, e));
                }
            }
        }

        log::info!(
            "Analysis: {} completed, {} empty, {} failed",
            report.completed.len(),
            report.empty.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Returns whether the result was empty
    fn run_one(&self, number: u32, output_dir: Option<&Path>) -> Result<bool> {
        let summary = self.summarize(number)?;
        if let Some(dir) = output_dir {
            let json = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
            fs::write(dir.join(format!("query_{}.json", number)), json)?;
            if self.render_charts {
                let svg = self.render_summary(number, &summary)?;
                let path = dir.join(format!("query_{}.svg", number));
                fs::write(&path, svg)?;
                log::debug!("Saved visualization to {}", path.display());
            }
        }
        Ok(summary.is_empty())
    }
}
