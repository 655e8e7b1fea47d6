use serde::{Deserialize, Serialize};

use joinery_kernel::geometry::unit_direction;
use joinery_kernel::{Point3, Ray, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f64 },
    /// Visible world height.
    Orthographic { height: f64 },
}

/// Viewport camera turning pointer positions into world rays.
///
/// Pointer coordinates are in pixels from the top-left corner of the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vector3,
    pub projection: Projection,
    pub width: f64,
    pub height: f64,
}

impl Camera {
    pub fn perspective(eye: Point3, target: Point3, width: f64, height: f64) -> Self {
        Self {
            eye,
            target,
            up: Vector3::y(),
            projection: Projection::Perspective {
                fov_y: 45f64.to_radians(),
            },
            width,
            height,
        }
    }

    pub fn orthographic(eye: Point3, target: Point3, view_height: f64, width: f64, height: f64) -> Self {
        Self {
            eye,
            target,
            up: Vector3::y(),
            projection: Projection::Orthographic { height: view_height },
            width,
            height,
        }
    }

    /// Forward, right and true-up unit vectors; `None` for a degenerate view.
    fn basis(&self) -> Option<(Vector3, Vector3, Vector3)> {
        let forward = unit_direction(&(self.target - self.eye))?;
        let right = unit_direction(&forward.cross(&self.up))?;
        Some((forward, right, right.cross(&forward)))
    }

    fn half_extents(&self) -> (f64, f64) {
        let half_h = match self.projection {
            Projection::Perspective { fov_y } => (fov_y / 2.0).tan(),
            Projection::Orthographic { height } => height / 2.0,
        };
        (half_h * self.width / self.height, half_h)
    }

    /// World ray under the pointer at `(x, y)`.
    pub fn ray(&self, x: f64, y: f64) -> Option<Ray> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let (forward, right, up) = self.basis()?;
        let nx = 2.0 * x / self.width - 1.0;
        let ny = 1.0 - 2.0 * y / self.height;
        let (half_w, half_h) = self.half_extents();
        let offset = right * (nx * half_w) + up * (ny * half_h);
        match self.projection {
            Projection::Perspective { .. } => Ray::new(self.eye, forward + offset),
            Projection::Orthographic { .. } => Ray::new(self.eye + offset, forward),
        }
    }

    /// World units covered by one pixel at the depth of `at`.
    pub fn pixel_size(&self, at: &Point3) -> f64 {
        let (_, half_h) = self.half_extents();
        match self.projection {
            Projection::Perspective { .. } => {
                let depth = self
                    .basis()
                    .map_or(0.0, |(forward, _, _)| (at - self.eye).dot(&forward).max(0.0));
                2.0 * depth * half_h / self.height
            }
            Projection::Orthographic { .. } => 2.0 * half_h / self.height,
        }
    }

    /// Pixel size at the camera target.
    pub fn focus_pixel_size(&self) -> f64 {
        self.pixel_size(&self.target)
    }

    /// Pointer position of a world point; `None` behind a perspective eye.
    pub fn project(&self, p: &Point3) -> Option<(f64, f64)> {
        let (forward, right, up) = self.basis()?;
        let rel = p - self.eye;
        let (half_w, half_h) = self.half_extents();
        let (nx, ny) = match self.projection {
            Projection::Perspective { .. } => {
                let depth = rel.dot(&forward);
                if depth <= 0.0 {
                    return None;
                }
                (rel.dot(&right) / (depth * half_w), rel.dot(&up) / (depth * half_h))
            }
            Projection::Orthographic { .. } => (rel.dot(&right) / half_w, rel.dot(&up) / half_h),
        };
        Some(((nx + 1.0) * self.width / 2.0, (1.0 - ny) * self.height / 2.0))
    }
}
