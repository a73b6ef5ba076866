//! Scan fixture files: one postcard-encoded [`ScanGrid`] per file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::types::ScanGrid;
use crate::error::Result;

/// File extension used for scan fixtures
pub const FIXTURE_EXTENSION: &str = "scan";

/// Write one scan to a fixture file
pub fn save_scan(path: &Path, grid: &ScanGrid) -> Result<()> {
    let bytes = postcard::to_allocvec(grid)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read one scan from a fixture file
pub fn load_scan(path: &Path) -> Result<ScanGrid> {
    let bytes = fs::read(path)?;
    let grid: ScanGrid = postcard::from_bytes(&bytes)?;
    grid.validate()
}

/// Write scans as `synthetic_scan_{i}.scan` under `dir`, creating it if needed
pub fn save_synthetic_scans(dir: &Path, scans: &[ScanGrid]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(scans.len());
    for (i, scan) in scans.iter().enumerate() {
        let path = dir.join(format!("synthetic_scan_{}.{}", i, FIXTURE_EXTENSION));
        save_scan(&path, scan)?;
        log::info!("Saved scan to {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}
