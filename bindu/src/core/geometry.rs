//! Spherical-to-Cartesian conversion for spinning multi-ring lidars.
//!
//! A raw scan is indexed by altitude ring (row) and encoder tick (column).
//! Both indices map to physical angles through a [`SensorGeometry`]
//! descriptor. The default descriptor is the native 32-ring sensor:
//!
//! ```text
//! encoder_angle  = tick * π / 512
//! altitude_angle = (-22 + ring * ((21.4764 * 2 + 1) / 32)) * π / 180
//!
//! x =  r · cos(enc) · cos(alt)
//! y =  r · sin(enc) · cos(alt)
//! z = -r · sin(alt)
//! ```
//!
//! The encoder sweeps half a turn per 512 ticks, and z is negated so that
//! rings above the sensor horizon land at negative z. Downstream map files
//! depend on both conventions.
//!
//! Angles come from the descriptor, never from the array shape. Feeding a
//! grid of a different shape to [`SensorGeometry::transform`] yields
//! well-defined but geometrically wrong points; use
//! [`SensorGeometry::transform_checked`] to reject such grids.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::types::{Point3, ScanGrid};
use crate::error::{Error, Result};

/// Angular layout of a specific sensor model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorGeometry {
    /// Native number of altitude rings
    pub ring_count: usize,
    /// Native number of encoder ticks per scan
    pub encoder_count: usize,
    /// Encoder ticks per half revolution (π radians)
    pub encoder_ticks_per_half_turn: f64,
    /// Altitude angle of ring 0 in degrees
    pub altitude_origin_deg: f64,
    /// Half of the vertical field of view in degrees
    pub altitude_half_fov_deg: f64,
    /// Extra vertical span added to the field of view in degrees
    pub altitude_margin_deg: f64,
}

impl Default for SensorGeometry {
    fn default() -> Self {
        Self {
            ring_count: 32,
            encoder_count: 512,
            encoder_ticks_per_half_turn: 512.0,
            altitude_origin_deg: -22.0,
            altitude_half_fov_deg: 21.4764,
            altitude_margin_deg: 1.0,
        }
    }
}

impl SensorGeometry {
    /// Angular step between adjacent rings in degrees
    #[inline]
    pub fn altitude_step_deg(&self) -> f64 {
        (self.altitude_half_fov_deg * 2.0 + self.altitude_margin_deg) / self.ring_count as f64
    }

    /// Encoder angle of a tick in radians
    #[inline]
    pub fn encoder_angle(&self, tick: usize) -> f64 {
        tick as f64 * PI / self.encoder_ticks_per_half_turn
    }

    /// Altitude angle of a ring in radians
    #[inline]
    pub fn altitude_angle(&self, ring: usize) -> f64 {
        (self.altitude_origin_deg + ring as f64 * self.altitude_step_deg()) * PI / 180.0
    }

    /// Convert a single range sample to Cartesian coordinates
    #[inline]
    pub fn to_cartesian(&self, ring: usize, tick: usize, radius: f64) -> Point3 {
        let enc = self.encoder_angle(tick);
        let alt = self.altitude_angle(ring);
        Point3 {
            x: radius * enc.cos() * alt.cos(),
            y: radius * enc.sin() * alt.cos(),
            z: -radius * alt.sin(),
        }
    }

    /// Transform a whole scan into points.
    ///
    /// Output is row-major (ring outer, tick inner) and always holds exactly
    /// `rings × ticks` points; zero ranges are kept.
    pub fn transform(&self, grid: &ScanGrid) -> Vec<Point3> {
        let mut points = Vec::with_capacity(grid.len());
        for (ring, row) in grid.rows().enumerate() {
            for (tick, &radius) in row.iter().enumerate() {
                points.push(self.to_cartesian(ring, tick, radius));
            }
        }
        points
    }

    /// Check that a grid has the sensor's native shape
    pub fn validate_shape(&self, grid: &ScanGrid) -> Result<()> {
        if grid.rings() != self.ring_count || grid.ticks() != self.encoder_count {
            return Err(Error::Schema(format!(
                "scan shape {}x{} does not match sensor geometry {}x{}",
                grid.rings(),
                grid.ticks(),
                self.ring_count,
                self.encoder_count
            )));
        }
        Ok(())
    }

    /// [`transform`](Self::transform) that rejects non-native grid shapes
    pub fn transform_checked(&self, grid: &ScanGrid) -> Result<Vec<Point3>> {
        self.validate_shape(grid)?;
        Ok(self.transform(grid))
    }
}

/// Transform a scan with the native sensor geometry.
pub fn transform(grid: &ScanGrid) -> Vec<Point3> {
    SensorGeometry::default().transform(grid)
}
