//! Builds a [`Geometries`] bundle and its topology index from a root source.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use joinery_kernel::geometry::{Point3, Vector3};
use kernel_bridge::{BrepKernel, CurveKind, ShapeHandle, ShapeKind};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::geometries::{EdgeGeometry, EdgeGeometryBuilder, FaceGeometry, FaceGeometryBuilder, Geometries, VertexGeometry};
use crate::topology::{EdgeKey, ParentRef, RootSource, TopologyIndex};

/// Index `source` from scratch.
///
/// Shapes with faces are triangulated through the kernel; a triangulation
/// failure aborts the build. Faces or edges the kernel has no mesh record
/// for are skipped. Shapes without faces are drawn as straight segments.
#[instrument(skip_all)]
pub fn build(
    kernel: &mut dyn BrepKernel,
    source: &RootSource,
    config: &IndexConfig,
) -> Result<(TopologyIndex, Geometries), IndexError> {
    let (topology, geometries) = match source {
        RootSource::Cloud(points) => build_point_cloud(points)?,
        RootSource::Shape(handle) => {
            let faces = kernel.explore(handle, ShapeKind::Face)?;
            if faces.is_empty() {
                build_wireframe(kernel, handle)?
            } else {
                kernel.triangulate(handle, config.linear_deflection)?;
                build_faceted(kernel, handle, &faces)?
            }
        }
    };
    info!(
        triangles = geometries.faces.triangle_count(),
        segments = geometries.edges.segment_count(),
        points = geometries.vertices.point_count(),
        "built geometries"
    );
    Ok((topology, geometries))
}

fn build_faceted(
    kernel: &dyn BrepKernel,
    root: &ShapeHandle,
    faces: &[ShapeHandle],
) -> Result<(TopologyIndex, Geometries), IndexError> {
    let mut topology = TopologyIndex::new();
    let mut face_builder = FaceGeometryBuilder::new();
    let mut polylines: Vec<(EdgeKey, Vec<u32>)> = Vec::new();
    let mut drawn_edges = HashSet::new();

    for face in faces {
        let Some(triangulation) = kernel.face_triangulation(face) else {
            warn!("face has no triangulation; skipped");
            continue;
        };
        let face_key = topology.face_for(kernel, *face, ParentRef::Root);
        let reversed = face.orientation() == joinery_kernel::topology::Orientation::Reversed;

        let positions: Vec<Point3> = triangulation.nodes.iter().map(|p| triangulation.location * p).collect();
        let normals: Vec<Vector3> = match &triangulation.normals {
            Some(normals) => normals
                .iter()
                .map(|n| {
                    let n = triangulation.location * n;
                    if reversed {
                        -n
                    } else {
                        n
                    }
                })
                .collect(),
            None => vec![kernel.face_plane(face)?.normal; positions.len()],
        };
        let mut triangles = Vec::with_capacity(triangulation.triangles.len());
        for &[a, b, c] in &triangulation.triangles {
            if a == 0 || b == 0 || c == 0 {
                return Err(IndexError::IndexOutOfBounds {
                    buffer: "face",
                    index: 0,
                    len: positions.len(),
                });
            }
            triangles.push(if reversed {
                [a - 1, c - 1, b - 1]
            } else {
                [a - 1, b - 1, c - 1]
            });
        }
        let offset = face_builder.push_face(&positions, &normals, &triangles, face_key)?;

        for edge in kernel.explore(face, ShapeKind::Edge)? {
            let identity = kernel.identity(&edge);
            if drawn_edges.contains(&identity) {
                continue;
            }
            let Some(polygon) = kernel.polygon_on_triangulation(&edge, face) else {
                debug!("edge has no polygon on triangulation; skipped");
                continue;
            };
            let mut nodes = Vec::with_capacity(polygon.nodes.len());
            for &n in &polygon.nodes {
                if n == 0 || n as usize > positions.len() {
                    return Err(IndexError::IndexOutOfBounds {
                        buffer: "edge",
                        index: n,
                        len: positions.len(),
                    });
                }
                nodes.push(offset + n - 1);
            }
            drawn_edges.insert(identity);
            let edge_key = topology.edge_for(kernel, edge, ParentRef::Face(face_key));
            polylines.push((edge_key, nodes));
        }
    }

    let vertices = index_vertices(kernel, root, &mut topology)?;
    let faces = face_builder.finish()?;
    let mut edge_builder = EdgeGeometryBuilder::sharing(faces.shared_positions());
    for (key, nodes) in &polylines {
        edge_builder.push_polyline(nodes, *key);
    }
    let edges = edge_builder.finish()?;

    Ok((topology, Geometries { faces, edges, vertices }))
}

/// Straight segments from each edge's two end points. Shared vertices are
/// written once per edge.
fn build_wireframe(kernel: &dyn BrepKernel, root: &ShapeHandle) -> Result<(TopologyIndex, Geometries), IndexError> {
    let mut topology = TopologyIndex::new();
    let mut edge_builder = EdgeGeometryBuilder::new();

    for edge in kernel.explore(root, ShapeKind::Edge)? {
        if kernel.edge_curve(&edge)? != CurveKind::Line {
            return Err(IndexError::CurvedWireUnsupported);
        }
        if topology.edge_key(kernel.identity(&edge)).is_some() {
            continue;
        }
        let ends = kernel.explore(&edge, ShapeKind::Vertex)?;
        let [start, end] = ends.as_slice() else {
            warn!(vertices = ends.len(), "edge without two end vertices; skipped");
            continue;
        };
        let a = kernel.vertex_point(start)?;
        let b = kernel.vertex_point(end)?;
        let key = topology.edge_for(kernel, edge, ParentRef::Root);
        edge_builder.push_segment(&a, &b, key);
    }

    let vertices = index_vertices(kernel, root, &mut topology)?;
    let edges = edge_builder.finish()?;
    Ok((
        topology,
        Geometries {
            faces: FaceGeometry::empty(),
            edges,
            vertices,
        },
    ))
}

/// One point per distinct vertex, in first-visit order, parented to the
/// first indexed edge that reaches it.
fn index_vertices(
    kernel: &dyn BrepKernel,
    root: &ShapeHandle,
    topology: &mut TopologyIndex,
) -> Result<VertexGeometry, IndexError> {
    let mut points = Vec::new();
    let mut seen = HashSet::new();
    for edge in kernel.explore(root, ShapeKind::Edge)? {
        let parent = topology
            .edge_key(kernel.identity(&edge))
            .map_or(ParentRef::Root, ParentRef::Edge);
        for vertex in kernel.explore(&edge, ShapeKind::Vertex)? {
            let key = topology.vertex_for(kernel, vertex, parent)?;
            if seen.insert(key) {
                if let Some(node) = topology.vertex(key) {
                    points.push((key, node.position));
                }
            }
        }
    }
    // Isolated vertices hang directly off the root.
    for vertex in kernel.explore(root, ShapeKind::Vertex)? {
        let key = topology.vertex_for(kernel, vertex, ParentRef::Root)?;
        if seen.insert(key) {
            if let Some(node) = topology.vertex(key) {
                points.push((key, node.position));
            }
        }
    }
    VertexGeometry::from_points(&points)
}

fn build_point_cloud(points: &[Point3]) -> Result<(TopologyIndex, Geometries), IndexError> {
    let mut topology = TopologyIndex::new();
    let indexed: Vec<_> = points.iter().map(|p| (topology.synthetic_vertex(*p), *p)).collect();
    let vertices = VertexGeometry::from_points(&indexed)?;
    Ok((
        topology,
        Geometries {
            faces: FaceGeometry::empty(),
            edges: EdgeGeometry::empty(),
            vertices,
        },
    ))
}
