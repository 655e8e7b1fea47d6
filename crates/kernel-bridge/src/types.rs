use serde::{Deserialize, Serialize};

use joinery_kernel::geometry::{Isometry3, Point3, Vector3};
use joinery_kernel::topology::{NodeId, Orientation, TopoKind};

/// Kernel-native handle to a shape: a node plus the orientation and
/// placement under which it is seen.
///
/// Two handles compare equal only when all three parts match. Whether two
/// handles denote the same underlying entity is a kernel question, answered
/// by [`BrepKernel::identity`](crate::BrepKernel::identity).
/// NEVER persisted. Valid only for the current kernel session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHandle {
    node: NodeId,
    orientation: Orientation,
    location: Isometry3,
}

impl ShapeHandle {
    pub(crate) fn new(node: NodeId, orientation: Orientation, location: Isometry3) -> Self {
        Self {
            node,
            orientation,
            location,
        }
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn location(&self) -> &Isometry3 {
        &self.location
    }

    /// The same shape with `placement` applied on top of its current one.
    pub fn moved(&self, placement: &Isometry3) -> Self {
        Self {
            location: placement * self.location,
            ..*self
        }
    }

    /// The same shape placed exactly at `location`.
    pub fn located(&self, location: Isometry3) -> Self {
        Self { location, ..*self }
    }

    pub fn reversed(&self) -> Self {
        Self {
            orientation: self.orientation.reversed(),
            ..*self
        }
    }
}

/// Orientation- and placement-independent identity of a kernel entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeIdentity(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Vertex,
    Edge,
    Wire,
    Face,
    Shell,
    Solid,
    Compound,
}

impl From<TopoKind> for ShapeKind {
    fn from(kind: TopoKind) -> Self {
        match kind {
            TopoKind::Vertex => ShapeKind::Vertex,
            TopoKind::Edge => ShapeKind::Edge,
            TopoKind::Wire => ShapeKind::Wire,
            TopoKind::Face => ShapeKind::Face,
            TopoKind::Shell => ShapeKind::Shell,
            TopoKind::Solid => ShapeKind::Solid,
            TopoKind::Compound => ShapeKind::Compound,
        }
    }
}

impl From<ShapeKind> for TopoKind {
    fn from(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Vertex => TopoKind::Vertex,
            ShapeKind::Edge => TopoKind::Edge,
            ShapeKind::Wire => TopoKind::Wire,
            ShapeKind::Face => TopoKind::Face,
            ShapeKind::Shell => TopoKind::Shell,
            ShapeKind::Solid => TopoKind::Solid,
            ShapeKind::Compound => TopoKind::Compound,
        }
    }
}

/// Geometric type of an edge's underlying curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    Line,
    Circle,
}

/// Errors from kernel operations. Every operation may fail and is never
/// retried by callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("triangulation failed: {reason}")]
    TriangulationFailed { reason: String },

    #[error("operation did not complete: {operation}")]
    NotDone { operation: String },

    #[error("invalid shape handle: {reason}")]
    InvalidHandle { reason: String },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },
}

/// Triangulation record of one face.
///
/// `nodes` are in the face's local frame; world positions are
/// `location * node`. Triangle entries index `nodes` starting from 1 and
/// follow the face's natural orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceTriangulation {
    pub nodes: Vec<Point3>,
    pub normals: Option<Vec<Vector3>>,
    pub triangles: Vec<[u32; 3]>,
    pub location: Isometry3,
}

impl FaceTriangulation {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn world_node(&self, one_based: u32) -> Option<Point3> {
        let i = (one_based as usize).checked_sub(1)?;
        self.nodes.get(i).map(|p| self.location * p)
    }
}

/// Edge polyline expressed as 1-based node indices into a face triangulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonOnTriangulation {
    pub nodes: Vec<u32>,
}

/// Minimum distance between two shapes with the nearest point on each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceResult {
    pub value: f64,
    pub on_first: Point3,
    pub on_second: Point3,
}
