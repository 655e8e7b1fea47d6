//! Planar face tessellation.
//!
//! Faces are meshed in their own frame: node coordinates include placements
//! found below the face but not the face's own placement, which callers get
//! from the face [`Occurrence`]. Triangle and polygon indices are 1-based.

use tracing::{debug, instrument};

use crate::geometry::{Point3, UnitQuaternion, Vector3};
use crate::topology::{EdgeCurve, EntityStore, NodeId, Occurrence, Orientation, TopoKind, TopoNode, TopologyError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TessellationError {
    #[error("invalid deflection: {deflection}")]
    InvalidDeflection { deflection: f64 },

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Node indices of one boundary edge inside a face mesh, in the edge's own
/// start-to-end direction.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePolygon {
    pub edge: NodeId,
    pub nodes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceMesh {
    pub nodes: Vec<Point3>,
    pub normals: Vec<Vector3>,
    pub triangles: Vec<[u32; 3]>,
    pub edge_polygons: Vec<EdgePolygon>,
}

impl FaceMesh {
    pub fn polygon_for(&self, edge: NodeId) -> Option<&EdgePolygon> {
        self.edge_polygons.iter().find(|p| p.edge == edge)
    }
}

fn check_deflection(deflection: f64) -> Result<(), TessellationError> {
    if deflection.is_finite() && deflection > 0.0 {
        Ok(())
    } else {
        Err(TessellationError::InvalidDeflection { deflection })
    }
}

/// Sample an edge curve from `start` to `end`, both included.
pub fn edge_points(start: Point3, end: Point3, curve: EdgeCurve, deflection: f64) -> Vec<Point3> {
    let EdgeCurve::Arc { center, normal } = curve else {
        return vec![start, end];
    };
    let v0 = start - center;
    let v1 = end - center;
    let radius = v0.norm();
    let closed = crate::default_tolerance().points_coincident(&start, &end);
    let mut sweep = v0.cross(&v1).dot(&normal).atan2(v0.dot(&v1));
    if closed {
        sweep = std::f64::consts::TAU;
    } else if sweep <= 0.0 {
        sweep += std::f64::consts::TAU;
    }

    let max_step = if deflection >= radius {
        std::f64::consts::PI
    } else {
        2.0 * (1.0 - deflection / radius).acos()
    };
    let min_segments = if closed { 3 } else { 1 };
    let segments = ((sweep / max_step).ceil() as usize).max(min_segments);
    let axis = nalgebra::Unit::new_unchecked(normal);

    let mut points = Vec::with_capacity(segments + 1);
    points.push(start);
    for k in 1..segments {
        let rotation = UnitQuaternion::from_axis_angle(&axis, sweep * k as f64 / segments as f64);
        points.push(center + rotation * v0);
    }
    points.push(end);
    points
}

/// Mesh one planar face. `Ok(None)` when the face has no usable area.
pub fn mesh_face(store: &EntityStore, face: NodeId, deflection: f64) -> Result<Option<FaceMesh>, TessellationError> {
    check_deflection(deflection)?;
    let (plane, outer) = match store.node(face)? {
        TopoNode::Face { plane, outer } => (*plane, *outer),
        other => {
            return Err(TopologyError::WrongKind {
                expected: TopoKind::Face,
                found: other.kind(),
            }
            .into())
        }
    };

    let mut nodes: Vec<Point3> = Vec::new();
    let mut spans: Vec<(NodeId, Orientation, Vec<u32>)> = Vec::new();
    for occ in store.explore(outer, TopoKind::Edge)? {
        let (start, end, curve) = store.edge_geometry(occ.node)?;
        let mut points: Vec<Point3> = edge_points(start, end, curve, deflection)
            .into_iter()
            .map(|p| occ.location * p)
            .collect();
        if occ.orientation == Orientation::Reversed {
            points.reverse();
        }
        let first = nodes.len() as u32 + 1;
        let last = points.len() - 1;
        nodes.extend_from_slice(&points[..last]);
        spans.push((occ.node, occ.orientation, (0..=last as u32).map(|k| first + k).collect()));
    }

    let count = nodes.len() as u32;
    if count < 3 {
        debug!(?face, nodes = count, "skipping face with too few nodes");
        return Ok(None);
    }

    let newell = (0..nodes.len()).fold(Vector3::zeros(), |acc, i| {
        let a = nodes[i].coords;
        let b = nodes[(i + 1) % nodes.len()].coords;
        acc + a.cross(&b)
    });
    let tol = crate::default_tolerance().coincidence;
    if newell.norm() / 2.0 <= tol * tol {
        debug!(?face, "skipping face with vanishing area");
        return Ok(None);
    }
    let flip = newell.dot(&plane.normal) < 0.0;

    let triangles = (2..count)
        .map(|k| if flip { [1, k + 1, k] } else { [1, k, k + 1] })
        .collect();

    let edge_polygons = spans
        .into_iter()
        .map(|(edge, orientation, mut indices)| {
            // The closing node of the loop is node 1.
            for i in indices.iter_mut() {
                if *i > count {
                    *i = 1;
                }
            }
            if orientation == Orientation::Reversed {
                indices.reverse();
            }
            EdgePolygon { edge, nodes: indices }
        })
        .collect();

    Ok(Some(FaceMesh {
        normals: vec![plane.normal; nodes.len()],
        nodes,
        triangles,
        edge_polygons,
    }))
}

/// Mesh every face occurrence under `root`, keeping exploration order.
#[instrument(skip(store))]
pub fn mesh_shape(
    store: &EntityStore,
    root: NodeId,
    deflection: f64,
) -> Result<Vec<(Occurrence, Option<FaceMesh>)>, TessellationError> {
    check_deflection(deflection)?;
    let faces = store.explore(root, TopoKind::Face)?;
    let mut meshes = Vec::with_capacity(faces.len());
    for occ in faces {
        meshes.push((occ, mesh_face(store, occ.node, deflection)?));
    }
    debug!(faces = meshes.len(), "tessellated shape");
    Ok(meshes)
}
