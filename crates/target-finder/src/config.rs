use serde::{Deserialize, Serialize};

use joinery_kernel::Axis;

/// Snapping parameters for target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Snap radius around preferred points and lines, in pixels.
    pub snap_threshold_pixels: f64,
    pub up_axis: Axis,
    /// Multiplier applied to the up axis when choosing a fallback plane.
    pub up_axis_weight: f64,
    /// World-space tolerance for coincidence and deduplication.
    pub tolerance: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_threshold_pixels: 10.0,
            up_axis: Axis::Y,
            up_axis_weight: 1.5,
            tolerance: 1e-6,
        }
    }
}

impl SnapConfig {
    /// Z-up scenes, as exported by most CAD packages.
    pub fn z_up() -> Self {
        Self {
            up_axis: Axis::Z,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
