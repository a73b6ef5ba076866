//! Raw scan blob encoding.
//!
//! Samples are stored as contiguous little-endian `f64` values in row-major
//! order. The blob carries no header; dimensions live in their own columns.

use crate::core::types::{ScanGrid, check_dimensions};
use crate::error::{Error, Result};

/// Bytes per encoded sample
pub const SAMPLE_BYTES: usize = std::mem::size_of::<f64>();

/// Encode samples into a blob
pub fn encode_samples(samples: &[f64]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(samples.len() * SAMPLE_BYTES);
    for value in samples {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode a blob into a grid of the declared shape
pub fn decode_grid(blob: &[u8], rings: usize, ticks: usize) -> Result<ScanGrid> {
    if blob.len() % SAMPLE_BYTES != 0 {
        return Err(Error::Schema(format!(
            "scan blob of {} bytes is not a whole number of samples",
            blob.len()
        )));
    }
    let samples: Vec<f64> = blob
        .chunks_exact(SAMPLE_BYTES)
        .map(|chunk| {
            let mut bytes = [0u8; SAMPLE_BYTES];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();
    check_dimensions(samples.len(), rings, ticks)?;
    ScanGrid::new(rings, ticks, samples)
}
