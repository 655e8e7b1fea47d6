//! Snap candidates derived from the active constraint.
//!
//! Both lists are recomputed whenever the constraint changes and are kept in
//! a fixed order: candidates through the origin come before those through the
//! neighbor point, and axes go X, Y, Z.

use joinery_kernel::geometry::intersection::{line_line_intersection, line_plane, plane_plane};
use joinery_kernel::{Axis, Line, Point3};

use crate::config::SnapConfig;
use crate::constraint::Constraint;

/// Directions this close to perpendicular count as lying in a plane.
const ANGULAR_TOLERANCE: f64 = 1e-9;

fn push_unique_line(lines: &mut Vec<Line>, line: Line, tol: f64) {
    if !lines.iter().any(|l| l.coincides_with(&line, ANGULAR_TOLERANCE, tol)) {
        lines.push(line);
    }
}

fn push_unique_point(points: &mut Vec<Point3>, p: Point3, tol: f64) {
    if !points.iter().any(|q| nalgebra::distance(q, &p) < tol) {
        points.push(p);
    }
}

/// Lines a target snaps onto under `constraint`.
pub fn preferred_lines(constraint: &Constraint, config: &SnapConfig) -> Vec<Line> {
    let tol = config.tolerance;
    let mut lines = Vec::new();
    match constraint {
        Constraint::None | Constraint::NearPoint(_) => {
            for axis in Axis::ALL {
                push_unique_line(&mut lines, axis.line_through(Point3::origin()), tol);
            }
            if let Some(neighbor) = constraint.neighbor() {
                for axis in Axis::ALL {
                    push_unique_line(&mut lines, axis.line_through(neighbor), tol);
                }
            }
        }
        Constraint::OnPlane { plane, anchor } => {
            for axis in Axis::ALL {
                if let Some(line) = plane_plane(plane, &axis.normal_plane(*anchor)) {
                    push_unique_line(&mut lines, line, tol);
                }
            }
            // Steepest line in the plane, following the up axis.
            if let Some(direction) = plane.project_direction(&config.up_axis.unit()) {
                if let Some(line) = Line::new(*anchor, direction) {
                    push_unique_line(&mut lines, line, tol);
                }
            }
            for axis in Axis::ALL {
                let line = axis.line_through(Point3::origin());
                if plane.contains_line(&line, ANGULAR_TOLERANCE, tol) {
                    push_unique_line(&mut lines, line, tol);
                }
            }
        }
        Constraint::OnLine { .. } => {}
    }
    lines
}

/// Points a target snaps onto: crossings of the preferred lines, plus the
/// world axes crossing a plane or line constraint. The neighbor point itself
/// is never a candidate.
pub fn preferred_points(lines: &[Line], constraint: &Constraint, config: &SnapConfig) -> Vec<Point3> {
    let tol = config.tolerance;
    let mut points = Vec::new();
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if let Some(p) = line_line_intersection(a, b, tol) {
                push_unique_point(&mut points, p, tol);
            }
        }
    }

    for axis in Axis::ALL {
        let axis_line = axis.line_through(Point3::origin());
        let crossing = match constraint {
            Constraint::OnPlane { plane, .. } => line_plane(&axis_line, plane).map(|(p, _)| p),
            Constraint::OnLine { line, .. } => line_line_intersection(&axis_line, line, tol),
            Constraint::None | Constraint::NearPoint(_) => None,
        };
        if let Some(p) = crossing {
            push_unique_point(&mut points, p, tol);
        }
    }

    if let Some(neighbor) = constraint.neighbor() {
        points.retain(|p| nalgebra::distance(p, &neighbor) >= tol);
    }
    points
}
