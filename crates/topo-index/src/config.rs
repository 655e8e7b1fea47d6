use serde::{Deserialize, Serialize};

/// Meshing parameters for geometry builds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum chord deviation of the triangulation, in world units.
    pub linear_deflection: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            linear_deflection: 0.1,
        }
    }
}

impl IndexConfig {
    /// Finer meshing for close-up work on small joints.
    pub fn fine() -> Self {
        Self {
            linear_deflection: 0.01,
        }
    }
}

/// Screen-space hit thresholds for the raycaster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    pub point_threshold_pixels: f64,
    pub line_threshold_pixels: f64,
    /// Hits this close behind the nearest one compete for snapping.
    pub snap_tolerance_pixels: f64,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            point_threshold_pixels: 10.0,
            line_threshold_pixels: 8.0,
            snap_tolerance_pixels: 10.0,
        }
    }
}

impl PickConfig {
    /// Wider thresholds for touch input.
    pub fn touch() -> Self {
        Self {
            point_threshold_pixels: 24.0,
            line_threshold_pixels: 20.0,
            snap_tolerance_pixels: 24.0,
        }
    }
}
