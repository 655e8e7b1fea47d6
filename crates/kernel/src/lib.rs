//! Arena-backed B-rep kernel for rectangular joinery parts.
//!
//! Holds the geometry primitives used across the workspace (lines, rays,
//! planes and their intersections), an arena topology store, box and wire
//! primitives, planar-face tessellation, and the distance/section queries.

pub mod geometry;
pub mod query;
pub mod tessellation;
pub mod topology;

pub use geometry::{Axis, Line, Plane, Point3, Ray, Vector3};

/// Tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3, b: &Point3) -> bool {
        nalgebra::distance(a, b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
