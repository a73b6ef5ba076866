//! # Bindu
//!
//! Ingestion, storage and analysis of spinning multi-ring LiDAR scans.
//!
//! ## Overview
//!
//! A raw scan is a dense grid of ranges indexed by altitude ring and encoder
//! tick. Bindu converts each grid to Cartesian points, stores raw and derived
//! data in SQLite, and runs a catalog of analytical queries over the stored
//! points. Points can also be handed to an external occupancy-map builder.
//!
//! ```text
//! ScanGrid ──transform──▶ [Point3] ──▶ ScanStore ──▶ AnalysisEngine ──▶ JSON / SVG
//!                                          │
//!                                          └──▶ points CSV ──▶ map builder ──▶ MapArtifact
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`core`] | Scan grid, point types, sensor geometry and transform |
//! | [`store`] | SQLite repository for scans, points and map artifacts |
//! | [`synth`] | Synthetic scan generator and scan fixture files |
//! | [`catalog`] | Numbered analytical query library |
//! | [`analysis`] | Query execution, summaries, SVG charts |
//! | [`octomap`] | Points CSV and external map builder |
//! | [`pipeline`] | Transform-and-store ingestion |
//! | [`config`] | YAML configuration |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bindu::{AnalysisEngine, Pipeline, QueryCatalog, ScanStore, SensorGeometry};
//! use bindu::synth::SyntheticScanGenerator;
//!
//! let store = ScanStore::open("lidar_data.db")?;
//! let pipeline = Pipeline::new(store.clone(), SensorGeometry::default());
//!
//! let scans = SyntheticScanGenerator::default().generate_multiple(3)?;
//! let report = pipeline.ingest_batch(&scans);
//!
//! let engine = AnalysisEngine::new(store, QueryCatalog::builtin()?);
//! let density = engine.summarize(5)?;
//! ```

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod octomap;
pub mod pipeline;
pub mod store;
pub mod synth;

pub use analysis::{AnalysisEngine, BatchReport, QueryOutcome, Summary};
pub use catalog::{AnalyticalQuery, QueryCatalog};
pub use config::BinduConfig;
pub use core::{MapArtifact, MapId, Point3, ScanGrid, ScanId, ScanSummary, SensorGeometry, transform};
pub use error::{Error, Result};
pub use octomap::{MapBuilder, MapExporter, ProcessMapBuilder};
pub use pipeline::{IngestReport, IngestedScan, Pipeline, PointBounds};
pub use store::{Clock, ManualClock, ScanStore, SystemClock, Table};
pub use synth::{NoiseGenerator, SyntheticScanGenerator};
