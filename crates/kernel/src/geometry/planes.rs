use serde::{Deserialize, Serialize};

use super::{unit_direction, Line, Point3, Vector3};

/// An infinite plane through `origin` with a unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    /// Build a plane; `None` for a zero-length normal.
    pub fn new(origin: Point3, normal: Vector3) -> Option<Self> {
        unit_direction(&normal).map(|normal| Self { origin, normal })
    }

    pub(crate) fn from_unit(origin: Point3, normal: Vector3) -> Self {
        Self { origin, normal }
    }

    /// Plane through three points; `None` when they are collinear.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        Self::new(*a, (b - a).cross(&(c - a)))
    }

    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    pub fn project_point(&self, p: &Point3) -> Point3 {
        p - self.normal * self.signed_distance(p)
    }

    pub fn contains_point(&self, p: &Point3, tol: f64) -> bool {
        self.signed_distance(p).abs() < tol
    }

    /// The line lies in the plane (perpendicular to the normal and passing
    /// through it).
    pub fn contains_line(&self, line: &Line, angular_tol: f64, tol: f64) -> bool {
        line.direction.dot(&self.normal).abs() < angular_tol && self.contains_point(&line.origin, tol)
    }

    /// Project `direction` into the plane; `None` when it is along the normal.
    pub fn project_direction(&self, direction: &Vector3) -> Option<Vector3> {
        unit_direction(&(direction - self.normal * direction.dot(&self.normal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_from_collinear_points_is_none() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(Plane::from_points(&a, &b, &c).is_none());
    }

    #[test]
    fn test_plane_projection() {
        let plane = Plane::new(Point3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 5.0, 0.0)).unwrap();
        let p = Point3::new(1.0, 7.0, -3.0);
        assert_relative_eq!(plane.signed_distance(&p), 5.0);
        assert_relative_eq!(plane.project_point(&p), Point3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_project_direction_along_normal_is_none() {
        let plane = Plane::new(Point3::origin(), Vector3::y()).unwrap();
        assert!(plane.project_direction(&Vector3::new(0.0, -2.0, 0.0)).is_none());
        let d = plane.project_direction(&Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(d, Vector3::x());
    }
}
