pub mod intersection;
pub mod lines;
pub mod planes;

pub use lines::{Line, Ray};
pub use planes::Plane;

use serde::{Deserialize, Serialize};

pub type Point3 = nalgebra::Point3<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Isometry3 = nalgebra::Isometry3<f64>;
pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

/// Directions shorter than this cannot be normalized.
pub const MIN_DIRECTION_LENGTH: f64 = 1e-12;

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(self) -> Vector3 {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The world axis as an infinite line through `through`.
    pub fn line_through(self, through: Point3) -> Line {
        Line::from_unit(through, self.unit())
    }

    /// The plane through `through` whose normal is this axis.
    pub fn normal_plane(self, through: Point3) -> Plane {
        Plane::from_unit(through, self.unit())
    }
}

/// Normalize `v`, or `None` when it is too short to carry a direction.
pub fn unit_direction(v: &Vector3) -> Option<Vector3> {
    let len = v.norm();
    if !len.is_finite() || len < MIN_DIRECTION_LENGTH {
        None
    } else {
        Some(v / len)
    }
}

/// Relative slack on pixel thresholds, so a distance computed at exactly
/// the threshold still counts after rounding.
pub const THRESHOLD_SLACK: f64 = 1e-9;

/// `distance` lies within `threshold`, threshold inclusive.
pub fn within_threshold(distance: f64, threshold: f64) -> bool {
    distance <= threshold * (1.0 + THRESHOLD_SLACK)
}

/// Narrow a point to the `f32` layout used by render buffers.
pub fn to_f32_array(p: &Point3) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}

/// Widen a render-buffer triple back to a point.
pub fn point_from_f32(xyz: &[f32]) -> Point3 {
    Point3::new(xyz[0] as f64, xyz[1] as f64, xyz[2] as f64)
}
