//! ArenaKernel: the in-workspace [`BrepKernel`] backed by the
//! `joinery-kernel` entity store.

use std::collections::HashMap;

use slotmap::Key;
use tracing::{debug, info, instrument};

use joinery_kernel::geometry::{Isometry3, Plane, Point3, Vector3};
use joinery_kernel::query::{self, QueryError};
use joinery_kernel::tessellation::{mesh_shape, FaceMesh, TessellationError};
use joinery_kernel::topology::{primitives, EdgeCurve, EntityStore, NodeId, Orientation, TopoNode, TopologyError};

use crate::traits::BrepKernel;
use crate::types::*;

/// Section and distance queries sample curved edges at this deflection.
const QUERY_DEFLECTION: f64 = 0.01;

impl From<TopologyError> for KernelError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::NodeNotFound { .. } | TopologyError::WrongKind { .. } => KernelError::InvalidHandle {
                reason: err.to_string(),
            },
            _ => KernelError::InvalidShape {
                reason: err.to_string(),
            },
        }
    }
}

impl From<TessellationError> for KernelError {
    fn from(err: TessellationError) -> Self {
        match err {
            TessellationError::Topology(inner) => inner.into(),
            other => KernelError::TriangulationFailed {
                reason: other.to_string(),
            },
        }
    }
}

fn query_error(operation: &str, err: QueryError) -> KernelError {
    match err {
        QueryError::Topology(inner) => inner.into(),
        QueryError::Tessellation(inner) => inner.into(),
        other => KernelError::NotDone {
            operation: format!("{operation}: {other}"),
        },
    }
}

pub struct ArenaKernel {
    store: EntityStore,
    triangulations: HashMap<NodeId, FaceMesh>,
}

impl ArenaKernel {
    pub fn new() -> Self {
        Self {
            store: EntityStore::new(),
            triangulations: HashMap::new(),
        }
    }

    /// Number of live nodes, for leak checks in tests.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    fn checked(&self, shape: &ShapeHandle) -> Result<NodeId, KernelError> {
        if self.store.contains(shape.node()) {
            Ok(shape.node())
        } else {
            Err(KernelError::InvalidHandle {
                reason: format!("{:?} is not a live shape", shape.node()),
            })
        }
    }

    /// Root shapes are handed out unlocated; placement lives on handles.
    fn root(node: NodeId) -> ShapeHandle {
        ShapeHandle::new(node, Orientation::Forward, Isometry3::identity())
    }
}

impl Default for ArenaKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl BrepKernel for ArenaKernel {
    #[instrument(skip(self))]
    fn make_box(&mut self, size: Vector3) -> Result<ShapeHandle, KernelError> {
        let node = primitives::make_box(&mut self.store, size)?;
        Ok(Self::root(node))
    }

    fn make_polyline(&mut self, points: &[Point3], closed: bool) -> Result<ShapeHandle, KernelError> {
        let node = primitives::make_polyline(&mut self.store, points, closed)?;
        Ok(Self::root(node))
    }

    fn make_arc(
        &mut self,
        center: Point3,
        start: Point3,
        end: Point3,
        normal: Vector3,
    ) -> Result<ShapeHandle, KernelError> {
        let node = primitives::make_arc(&mut self.store, center, start, end, normal)?;
        Ok(Self::root(node))
    }

    fn make_compound(&mut self, children: &[ShapeHandle]) -> Result<ShapeHandle, KernelError> {
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let node = self.checked(child)?;
            // Bake the child's placement into the arena so the compound
            // sees it where the handle did.
            if *child.location() != self.store.location(node) {
                self.store.set_location(node, *child.location())?;
            }
            nodes.push(node);
        }
        let node = primitives::make_compound(&mut self.store, nodes)?;
        info!(children = children.len(), "created compound");
        Ok(Self::root(node))
    }

    fn release(&mut self, shape: &ShapeHandle) -> Result<(), KernelError> {
        let node = self.checked(shape)?;
        let removed = self.store.remove_tree(node)?;
        let store = &self.store;
        self.triangulations.retain(|face, _| store.contains(*face));
        debug!(removed, "released shape");
        Ok(())
    }

    #[instrument(skip(self, shape))]
    fn triangulate(&mut self, shape: &ShapeHandle, linear_deflection: f64) -> Result<(), KernelError> {
        let node = self.checked(shape)?;
        let meshes = mesh_shape(&self.store, node, linear_deflection)?;
        let mut skipped = 0usize;
        for (occ, mesh) in meshes {
            match mesh {
                Some(mesh) => {
                    self.triangulations.insert(occ.node, mesh);
                }
                None => {
                    self.triangulations.remove(&occ.node);
                    skipped += 1;
                }
            }
        }
        debug!(skipped, "triangulated shape");
        Ok(())
    }

    fn face_triangulation(&self, face: &ShapeHandle) -> Option<FaceTriangulation> {
        let mesh = self.triangulations.get(&face.node())?;
        Some(FaceTriangulation {
            nodes: mesh.nodes.clone(),
            normals: Some(mesh.normals.clone()),
            triangles: mesh.triangles.clone(),
            location: *face.location(),
        })
    }

    fn polygon_on_triangulation(&self, edge: &ShapeHandle, face: &ShapeHandle) -> Option<PolygonOnTriangulation> {
        let mesh = self.triangulations.get(&face.node())?;
        mesh.polygon_for(edge.node()).map(|p| PolygonOnTriangulation { nodes: p.nodes.clone() })
    }

    fn shape_kind(&self, shape: &ShapeHandle) -> Result<ShapeKind, KernelError> {
        Ok(self.store.kind(shape.node())?.into())
    }

    fn explore(&self, shape: &ShapeHandle, kind: ShapeKind) -> Result<Vec<ShapeHandle>, KernelError> {
        let node = self.checked(shape)?;
        let found = self
            .store
            .explore_from(node, shape.orientation(), *shape.location(), kind.into())?;
        Ok(found
            .into_iter()
            .map(|occ| ShapeHandle::new(occ.node, occ.orientation, occ.location))
            .collect())
    }

    fn identity(&self, shape: &ShapeHandle) -> ShapeIdentity {
        ShapeIdentity(shape.node().data().as_ffi())
    }

    fn vertex_point(&self, vertex: &ShapeHandle) -> Result<Point3, KernelError> {
        let point = self.store.vertex_point(vertex.node())?;
        Ok(vertex.location() * point)
    }

    fn edge_curve(&self, edge: &ShapeHandle) -> Result<CurveKind, KernelError> {
        let (_, _, curve) = self.store.edge_geometry(edge.node())?;
        Ok(match curve {
            EdgeCurve::Line => CurveKind::Line,
            EdgeCurve::Arc { .. } => CurveKind::Circle,
        })
    }

    fn face_plane(&self, face: &ShapeHandle) -> Result<Plane, KernelError> {
        let plane = match self.store.node(face.node())? {
            TopoNode::Face { plane, .. } => *plane,
            other => {
                return Err(KernelError::InvalidHandle {
                    reason: format!("expected a face, found a {:?}", other.kind()),
                })
            }
        };
        let origin = face.location() * plane.origin;
        let mut normal = face.location() * plane.normal;
        if face.orientation() == Orientation::Reversed {
            normal = -normal;
        }
        Plane::new(origin, normal).ok_or_else(|| KernelError::InvalidShape {
            reason: "face plane has a degenerate normal".into(),
        })
    }

    fn distance(&self, a: &ShapeHandle, b: &ShapeHandle) -> Result<DistanceResult, KernelError> {
        // Handle placements are applied on a scratch copy of the store.
        let (na, nb) = (self.checked(a)?, self.checked(b)?);
        let located = *a.location() != self.store.location(na) || *b.location() != self.store.location(nb);
        let result = if located {
            let mut scratch = self.store.clone();
            scratch.set_location(na, *a.location())?;
            if na != nb {
                scratch.set_location(nb, *b.location())?;
            }
            query::distance(&scratch, na, nb, QUERY_DEFLECTION)
        } else {
            query::distance(&self.store, na, nb, QUERY_DEFLECTION)
        };
        let d = result.map_err(|e| query_error("distance", e))?;
        Ok(DistanceResult {
            value: d.value,
            on_first: d.on_first,
            on_second: d.on_second,
        })
    }

    #[instrument(skip(self, shape))]
    fn section(&mut self, shape: &ShapeHandle, plane: &Plane) -> Result<ShapeHandle, KernelError> {
        let node = self.checked(shape)?;
        // Cut in the shape's own frame, then hand the wire back under the
        // same placement.
        let inverse = shape.location().inverse();
        let local_plane = Plane::new(inverse * plane.origin, inverse * plane.normal).ok_or_else(|| {
            KernelError::InvalidShape {
                reason: "section plane has a degenerate normal".into(),
            }
        })?;
        let wire = query::section(&mut self.store, node, &local_plane, QUERY_DEFLECTION)
            .map_err(|e| query_error("section", e))?;
        info!("created section wire");
        Ok(ShapeHandle::new(wire, Orientation::Forward, *shape.location()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use joinery_kernel::geometry::UnitQuaternion;
    use std::collections::HashSet;

    fn unit_box(kernel: &mut ArenaKernel) -> ShapeHandle {
        kernel.make_box(Vector3::new(1.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_identity_ignores_orientation_and_location() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel);
        let moved = solid.located(Isometry3::translation(1.0, 2.0, 3.0)).reversed();
        assert_ne!(solid, moved);
        assert!(kernel.is_same(&solid, &moved));
    }

    #[test]
    fn test_explore_reports_duplicates() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel);
        let edges = kernel.explore(&solid, ShapeKind::Edge).unwrap();
        assert_eq!(edges.len(), 24);
        let ids: HashSet<_> = edges.iter().map(|e| kernel.identity(e)).collect();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_located_handle_moves_vertices() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel).located(Isometry3::translation(10.0, 0.0, 0.0));
        for v in kernel.explore(&solid, ShapeKind::Vertex).unwrap() {
            let p = kernel.vertex_point(&v).unwrap();
            assert!(p.x >= 10.0 - 1e-12 && p.x <= 11.0 + 1e-12);
        }
    }

    #[test]
    fn test_triangulation_records() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel);
        kernel.triangulate(&solid, 0.1).unwrap();
        for face in kernel.explore(&solid, ShapeKind::Face).unwrap() {
            let tri = kernel.face_triangulation(&face).unwrap();
            assert_eq!(tri.triangles.len(), 2);
            for edge in kernel.explore(&face, ShapeKind::Edge).unwrap() {
                let poly = kernel.polygon_on_triangulation(&edge, &face).unwrap();
                assert_eq!(poly.nodes.len(), 2);
            }
        }
    }

    #[test]
    fn test_triangulate_zero_deflection_fails() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel);
        assert!(matches!(
            kernel.triangulate(&solid, 0.0),
            Err(KernelError::TriangulationFailed { .. })
        ));
    }

    #[test]
    fn test_release_invalidates_handles() {
        let mut kernel = ArenaKernel::new();
        let solid = unit_box(&mut kernel);
        kernel.triangulate(&solid, 0.1).unwrap();
        let face = kernel.explore(&solid, ShapeKind::Face).unwrap()[0];
        kernel.release(&solid).unwrap();
        assert_eq!(kernel.node_count(), 0);
        assert!(kernel.face_triangulation(&face).is_none());
        assert!(matches!(
            kernel.explore(&solid, ShapeKind::Face),
            Err(KernelError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn test_face_plane_follows_rotation() {
        let mut kernel = ArenaKernel::new();
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let solid = unit_box(&mut kernel).located(Isometry3::from_parts(Vector3::zeros().into(), rotation));
        let faces = kernel.explore(&solid, ShapeKind::Face).unwrap();
        // The +x face of the local box now faces +y.
        let plane = kernel.face_plane(&faces[1]).unwrap();
        assert_relative_eq!(plane.normal, Vector3::y(), epsilon = 1e-12);
        let reversed = kernel.face_plane(&faces[1].reversed()).unwrap();
        assert_relative_eq!(reversed.normal, -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_distance_uses_handle_placement() {
        let mut kernel = ArenaKernel::new();
        let a = unit_box(&mut kernel);
        let b = unit_box(&mut kernel).located(Isometry3::translation(0.0, 3.0, 0.0));
        let d = kernel.distance(&a, &b).unwrap();
        assert_relative_eq!(d.value, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_section_miss_is_not_done() {
        let mut kernel = ArenaKernel::new();
        let a = unit_box(&mut kernel);
        let plane = Plane::new(Point3::new(0.0, 7.0, 0.0), Vector3::y()).unwrap();
        assert!(matches!(kernel.section(&a, &plane), Err(KernelError::NotDone { .. })));
    }

    #[test]
    fn test_arc_reports_circle_curve() {
        let mut kernel = ArenaKernel::new();
        let arc = kernel
            .make_arc(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Vector3::z(),
            )
            .unwrap();
        let edge = kernel.explore(&arc, ShapeKind::Edge).unwrap()[0];
        assert_eq!(kernel.edge_curve(&edge).unwrap(), CurveKind::Circle);
    }
}
