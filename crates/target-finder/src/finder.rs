use tracing::{debug, instrument};

use joinery_kernel::geometry::intersection::{line_line_closest, ray_plane, ray_segment_closest, segment_plane};
use joinery_kernel::geometry::within_threshold;
use joinery_kernel::{Axis, Line, Plane, Point3, Ray};
use topo_index::{HitGeometry, Intersection};

use crate::config::SnapConfig;
use crate::constraint::Constraint;
use crate::preferred::{preferred_lines, preferred_points};

/// Coordinates read back from `f32` render buffers are only this exact.
const BUFFER_TOLERANCE: f64 = 1e-4;

/// A resolved target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub point: Point3,
    /// Set when the target snapped onto a point.
    pub snapped_point: Option<Point3>,
    /// Set when the target snapped onto a line.
    pub snapped_line: Option<Line>,
    /// Plane the target was resolved on, if any.
    pub plane: Option<Plane>,
}

impl Target {
    fn free(point: Point3, plane: Option<Plane>) -> Self {
        Self {
            point,
            snapped_point: None,
            snapped_line: None,
            plane,
        }
    }

    fn on_point(point: Point3, plane: Option<Plane>) -> Self {
        Self {
            point,
            snapped_point: Some(point),
            snapped_line: None,
            plane,
        }
    }

    fn on_line(point: Point3, line: Line, plane: Option<Plane>) -> Self {
        Self {
            point,
            snapped_point: None,
            snapped_line: Some(line),
            plane,
        }
    }
}

/// Turns pointer rays into target points under the active constraint.
#[derive(Debug, Clone)]
pub struct TargetFinder {
    config: SnapConfig,
    constraint: Constraint,
    preferred_lines: Vec<Line>,
    preferred_points: Vec<Point3>,
}

impl Default for TargetFinder {
    fn default() -> Self {
        Self::new(SnapConfig::default())
    }
}

impl TargetFinder {
    pub fn new(config: SnapConfig) -> Self {
        let mut finder = Self {
            config,
            constraint: Constraint::None,
            preferred_lines: Vec::new(),
            preferred_points: Vec::new(),
        };
        finder.recompute();
        finder
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn preferred_lines(&self) -> &[Line] {
        &self.preferred_lines
    }

    pub fn preferred_points(&self) -> &[Point3] {
        &self.preferred_points
    }

    /// Replace the constraint, returning the previous one.
    pub fn set_constraint(&mut self, constraint: Constraint) -> Constraint {
        let previous = std::mem::replace(&mut self.constraint, constraint);
        self.recompute();
        previous
    }

    pub fn clear_constraint(&mut self) -> Constraint {
        self.set_constraint(Constraint::None)
    }

    fn recompute(&mut self) {
        self.preferred_lines = preferred_lines(&self.constraint, &self.config);
        self.preferred_points = preferred_points(&self.preferred_lines, &self.constraint, &self.config);
        debug!(
            lines = self.preferred_lines.len(),
            points = self.preferred_points.len(),
            "recomputed preferred snaps"
        );
    }

    /// Resolve `ray` into a target.
    ///
    /// `pixel_size` is the world size of one screen pixel at the focus
    /// distance. `picked` is the pick result under the pointer, which
    /// competes ahead of the preferred candidates in each tier. `None` when
    /// the ray cannot reach the constraint (a ray parallel to the constraint
    /// plane, say) and nothing snapped.
    #[instrument(skip(self, picked), level = "trace")]
    pub fn find_target<K>(&self, ray: &Ray, pixel_size: f64, picked: Option<&Intersection<K>>) -> Option<Target> {
        let threshold = self.config.snap_threshold_pixels * pixel_size;
        let geometry = picked.map(|hit| hit.geometry);

        self.snap_to_point(ray, threshold, geometry.as_ref())
            .or_else(|| self.snap_to_line(ray, threshold, geometry.as_ref()))
            .or_else(|| picked.and_then(|hit| self.picked_face(hit)))
            .or_else(|| self.fallback(ray))
    }

    fn constraint_plane(&self) -> Option<Plane> {
        self.constraint.plane().copied()
    }

    fn snap_to_point(&self, ray: &Ray, threshold: f64, picked: Option<&HitGeometry>) -> Option<Target> {
        let picked_point = match picked {
            Some(HitGeometry::Point(p)) => Some(*p).filter(|p| self.constraint.satisfies(p, BUFFER_TOLERANCE)),
            Some(HitGeometry::Segment([a, b])) => self
                .edge_crossing(a, b)
                .filter(|p| within_threshold(ray.distance_to_point(p), threshold)),
            _ => None,
        };
        if let Some(p) = picked_point {
            debug!(point = ?p, "snapped to picked point");
            return Some(Target::on_point(p, self.constraint_plane()));
        }

        let p = self
            .preferred_points
            .iter()
            .find(|p| within_threshold(ray.distance_to_point(p), threshold))?;
        debug!(point = ?p, "snapped to preferred point");
        Some(Target::on_point(*p, self.constraint_plane()))
    }

    /// Where a picked edge meets the constraint plane or line.
    fn edge_crossing(&self, a: &Point3, b: &Point3) -> Option<Point3> {
        match &self.constraint {
            Constraint::OnPlane { plane, .. } => {
                let in_plane =
                    plane.contains_point(a, BUFFER_TOLERANCE) && plane.contains_point(b, BUFFER_TOLERANCE);
                if in_plane {
                    None
                } else {
                    segment_plane(a, b, plane, BUFFER_TOLERANCE)
                }
            }
            Constraint::OnLine { line, .. } => {
                let edge = Line::through(*a, *b)?;
                let closest = line_line_closest(&edge, line)?;
                let length = nalgebra::distance(a, b);
                let on_edge = (-BUFFER_TOLERANCE..=length + BUFFER_TOLERANCE).contains(&closest.t_first);
                (on_edge && closest.distance < BUFFER_TOLERANCE).then_some(closest.on_second)
            }
            Constraint::None | Constraint::NearPoint(_) => None,
        }
    }

    fn snap_to_line(&self, ray: &Ray, threshold: f64, picked: Option<&HitGeometry>) -> Option<Target> {
        if let Some(HitGeometry::Segment([a, b])) = picked {
            let usable = match &self.constraint {
                Constraint::None | Constraint::NearPoint(_) => true,
                Constraint::OnPlane { plane, .. } => {
                    plane.contains_point(a, BUFFER_TOLERANCE) && plane.contains_point(b, BUFFER_TOLERANCE)
                }
                Constraint::OnLine { .. } => false,
            };
            if usable {
                if let Some(line) = Line::through(*a, *b) {
                    let closest = ray_segment_closest(ray, a, b);
                    debug!("snapped to picked edge");
                    return Some(Target::on_line(closest.on_segment, line, self.constraint_plane()));
                }
            }
        }

        let ray_line = ray.as_line();
        let (line, point, _) = self
            .preferred_lines
            .iter()
            .filter_map(|line| {
                let c = line_line_closest(&ray_line, line)?;
                (c.t_first >= 0.0 && within_threshold(c.distance, threshold)).then_some((*line, c.on_second, c.distance))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))?;
        debug!(direction = ?line.direction, "snapped to preferred line");
        Some(Target::on_line(point, line, self.constraint_plane()))
    }

    fn picked_face<K>(&self, hit: &Intersection<K>) -> Option<Target> {
        if !self.constraint.is_free() {
            return None;
        }
        let plane = hit.geometry.plane()?;
        debug!("resolved on picked face");
        Some(Target::free(hit.point, Some(plane)))
    }

    fn fallback(&self, ray: &Ray) -> Option<Target> {
        match &self.constraint {
            Constraint::OnLine { line, .. } => {
                let c = line_line_closest(&ray.as_line(), line)?;
                let point = if c.t_first >= 0.0 {
                    c.on_second
                } else {
                    // The line passes behind the eye; stay nearest the ray start.
                    line.closest_point(&ray.origin).0
                };
                Some(Target::free(point, None))
            }
            Constraint::OnPlane { plane, .. } => {
                let (point, _) = ray_plane(ray, plane)?;
                Some(Target::free(point, Some(*plane)))
            }
            Constraint::None | Constraint::NearPoint(_) => {
                let through = self.constraint.neighbor().unwrap_or_else(Point3::origin);
                let mut axes = Axis::ALL.map(|axis| {
                    let weight = if axis == self.config.up_axis {
                        self.config.up_axis_weight
                    } else {
                        1.0
                    };
                    (axis, ray.direction.dot(&axis.unit()).abs() * weight)
                });
                axes.sort_by(|a, b| b.1.total_cmp(&a.1));
                axes.iter().find_map(|(axis, _)| {
                    let plane = axis.normal_plane(through);
                    ray_plane(ray, &plane).map(|(point, _)| Target::free(point, Some(plane)))
                })
            }
        }
    }
}
