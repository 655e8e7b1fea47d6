use serde::{Deserialize, Serialize};

use super::{unit_direction, Point3, Vector3};

/// An infinite line through `origin` with a unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Line {
    /// Build a line; `None` for a zero-length direction.
    pub fn new(origin: Point3, direction: Vector3) -> Option<Self> {
        unit_direction(&direction).map(|direction| Self { origin, direction })
    }

    /// Build a line from a direction already known to be unit length.
    pub(crate) fn from_unit(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// The line through `a` and `b`; `None` when they coincide.
    pub fn through(a: Point3, b: Point3) -> Option<Self> {
        Self::new(a, b - a)
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Closest point on the line to `p`, with its parameter.
    pub fn closest_point(&self, p: &Point3) -> (Point3, f64) {
        let t = (p - self.origin).dot(&self.direction);
        (self.point_at(t), t)
    }

    pub fn distance_to_point(&self, p: &Point3) -> f64 {
        let (closest, _) = self.closest_point(p);
        nalgebra::distance(&closest, p)
    }

    pub fn is_parallel_to(&self, other: &Line, angular_tol: f64) -> bool {
        self.direction.cross(&other.direction).norm() < angular_tol
    }

    /// Same infinite line, regardless of origin or direction sign.
    pub fn coincides_with(&self, other: &Line, angular_tol: f64, tol: f64) -> bool {
        self.is_parallel_to(other, angular_tol) && self.distance_to_point(&other.origin) < tol
    }
}

/// A half-line starting at `origin` with a unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Build a ray; `None` for a zero-length direction.
    pub fn new(origin: Point3, direction: Vector3) -> Option<Self> {
        unit_direction(&direction).map(|direction| Self { origin, direction })
    }

    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// The infinite line carrying the ray.
    pub fn as_line(&self) -> Line {
        Line::from_unit(self.origin, self.direction)
    }

    /// Closest point on the ray to `p` (parameter clamped to the ray start).
    pub fn closest_point(&self, p: &Point3) -> (Point3, f64) {
        let t = (p - self.origin).dot(&self.direction).max(0.0);
        (self.at(t), t)
    }

    pub fn distance_to_point(&self, p: &Point3) -> f64 {
        let (closest, _) = self.closest_point(p);
        nalgebra::distance(&closest, p)
    }
}
