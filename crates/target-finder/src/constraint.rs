use serde::{Deserialize, Serialize};

use joinery_kernel::{Line, Plane, Point3};

/// Restriction on where a target may land.
///
/// `OnPlane` and `OnLine` carry an anchor, the point the current operation
/// started from, which doubles as the neighbor point for snapping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Constraint {
    #[default]
    None,
    /// Free placement, snapping relative to a neighbor point.
    NearPoint(Point3),
    OnPlane { plane: Plane, anchor: Point3 },
    OnLine { line: Line, anchor: Point3 },
}

impl Constraint {
    pub fn neighbor(&self) -> Option<Point3> {
        match self {
            Constraint::None => None,
            Constraint::NearPoint(p) => Some(*p),
            Constraint::OnPlane { anchor, .. } | Constraint::OnLine { anchor, .. } => Some(*anchor),
        }
    }

    /// No geometric restriction on the target.
    pub fn is_free(&self) -> bool {
        matches!(self, Constraint::None | Constraint::NearPoint(_))
    }

    pub fn plane(&self) -> Option<&Plane> {
        match self {
            Constraint::OnPlane { plane, .. } => Some(plane),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<&Line> {
        match self {
            Constraint::OnLine { line, .. } => Some(line),
            _ => None,
        }
    }

    pub fn satisfies(&self, p: &Point3, tol: f64) -> bool {
        match self {
            Constraint::None | Constraint::NearPoint(_) => true,
            Constraint::OnPlane { plane, .. } => plane.contains_point(p, tol),
            Constraint::OnLine { line, .. } => line.distance_to_point(p) < tol,
        }
    }
}
