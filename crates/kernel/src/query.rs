//! Wireframe distance and plane sections over arena shapes, in world space.

use tracing::{debug, instrument};

use crate::geometry::intersection::{segment_plane, segment_segment_closest};
use crate::geometry::{Plane, Point3};
use crate::tessellation::{edge_points, mesh_face, TessellationError};
use crate::topology::{EdgeCurve, EntityStore, NodeId, Orientation, TopoKind, TopoNode, TopologyError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("shape {node:?} has no measurable geometry")]
    EmptyShape { node: NodeId },

    #[error("plane does not cut shape {node:?}")]
    EmptySection { node: NodeId },

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Minimum distance between two shapes with the nearest point on each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceResult {
    pub value: f64,
    pub on_first: Point3,
    pub on_second: Point3,
}

/// World-space points, segments and face polygons of a shape.
#[derive(Debug, Default)]
struct WorldGeometry {
    points: Vec<Point3>,
    segments: Vec<(Point3, Point3)>,
    polygons: Vec<Vec<Point3>>,
}

impl WorldGeometry {
    fn collect(store: &EntityStore, root: NodeId, deflection: f64) -> Result<Self, QueryError> {
        let mut geometry = WorldGeometry::default();
        for occ in store.explore(root, TopoKind::Vertex)? {
            geometry.points.push(occ.location * store.vertex_point(occ.node)?);
        }
        for occ in store.explore(root, TopoKind::Edge)? {
            let (start, end, curve) = store.edge_geometry(occ.node)?;
            let points = edge_points(start, end, curve, deflection);
            geometry
                .segments
                .extend(points.windows(2).map(|w| (occ.location * w[0], occ.location * w[1])));
        }
        for occ in store.explore(root, TopoKind::Face)? {
            if let Some(mesh) = mesh_face(store, occ.node, deflection)? {
                geometry
                    .polygons
                    .push(mesh.nodes.iter().map(|p| occ.location * p).collect());
            }
        }
        Ok(geometry)
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty() && self.segments.is_empty()
    }
}

fn keep_closest(best: &mut Option<DistanceResult>, on_first: Point3, on_second: Point3) {
    let value = nalgebra::distance(&on_first, &on_second);
    if best.map_or(true, |b| value < b.value) {
        *best = Some(DistanceResult {
            value,
            on_first,
            on_second,
        });
    }
}

/// Foot of the perpendicular from `p` onto a convex planar polygon, when it
/// falls inside the polygon.
fn point_polygon_foot(p: &Point3, polygon: &[Point3]) -> Option<Point3> {
    let normal = (0..polygon.len()).fold(nalgebra::Vector3::zeros(), |acc, i| {
        acc + polygon[i].coords.cross(&polygon[(i + 1) % polygon.len()].coords)
    });
    let plane = Plane::new(polygon[0], normal)?;
    let foot = plane.project_point(p);
    let inside = (0..polygon.len()).all(|i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        (b - a).cross(&(foot - a)).dot(&plane.normal) >= -1e-12
    });
    inside.then_some(foot)
}

/// Minimum distance between two shapes.
///
/// Considers vertex, edge and face geometry of both sides. Overlapping
/// solids report the distance between their boundaries.
#[instrument(skip(store))]
pub fn distance(store: &EntityStore, first: NodeId, second: NodeId, deflection: f64) -> Result<DistanceResult, QueryError> {
    let a = WorldGeometry::collect(store, first, deflection)?;
    let b = WorldGeometry::collect(store, second, deflection)?;
    if a.is_empty() {
        return Err(QueryError::EmptyShape { node: first });
    }
    if b.is_empty() {
        return Err(QueryError::EmptyShape { node: second });
    }

    let mut best = None;
    for pa in &a.points {
        for pb in &b.points {
            keep_closest(&mut best, *pa, *pb);
        }
        for (s0, s1) in &b.segments {
            let (_, on_b) = segment_segment_closest(pa, pa, s0, s1);
            keep_closest(&mut best, *pa, on_b);
        }
        for polygon in &b.polygons {
            if let Some(foot) = point_polygon_foot(pa, polygon) {
                keep_closest(&mut best, *pa, foot);
            }
        }
    }
    for pb in &b.points {
        for (s0, s1) in &a.segments {
            let (_, on_a) = segment_segment_closest(pb, pb, s0, s1);
            keep_closest(&mut best, on_a, *pb);
        }
        for polygon in &a.polygons {
            if let Some(foot) = point_polygon_foot(pb, polygon) {
                keep_closest(&mut best, foot, *pb);
            }
        }
    }
    for (a0, a1) in &a.segments {
        for (b0, b1) in &b.segments {
            let (on_a, on_b) = segment_segment_closest(a0, a1, b0, b1);
            keep_closest(&mut best, on_a, on_b);
        }
    }
    best.ok_or(QueryError::EmptyShape { node: first })
}

/// Cut `root` with `plane`, producing a new wire of straight edges in world
/// coordinates. Each face crossing the plane contributes one segment; edges
/// lying in the plane contribute themselves.
#[instrument(skip(store))]
pub fn section(store: &mut EntityStore, root: NodeId, plane: &Plane, deflection: f64) -> Result<NodeId, QueryError> {
    let tol = crate::default_tolerance();
    let geometry = WorldGeometry::collect(store, root, deflection)?;

    let mut segments: Vec<(Point3, Point3)> = Vec::new();
    let push_unique = |a: Point3, b: Point3, segments: &mut Vec<(Point3, Point3)>| {
        if tol.points_coincident(&a, &b) {
            return;
        }
        let duplicate = segments.iter().any(|(p, q)| {
            (tol.points_coincident(p, &a) && tol.points_coincident(q, &b))
                || (tol.points_coincident(p, &b) && tol.points_coincident(q, &a))
        });
        if !duplicate {
            segments.push((a, b));
        }
    };

    for polygon in &geometry.polygons {
        let mut crossings: Vec<Point3> = Vec::new();
        for i in 0..polygon.len() {
            let (a, b) = (polygon[i], polygon[(i + 1) % polygon.len()]);
            if let Some(p) = segment_plane(&a, &b, plane, tol.coincidence) {
                if !crossings.iter().any(|c| tol.points_coincident(c, &p)) {
                    crossings.push(p);
                }
            }
        }
        if let [a, b] = crossings.as_slice() {
            push_unique(*a, *b, &mut segments);
        }
    }
    if geometry.polygons.is_empty() {
        for (a, b) in &geometry.segments {
            if plane.contains_point(a, tol.coincidence) && plane.contains_point(b, tol.coincidence) {
                push_unique(*a, *b, &mut segments);
            }
        }
    }

    if segments.is_empty() {
        return Err(QueryError::EmptySection { node: root });
    }
    debug!(segments = segments.len(), "section computed");

    let mut vertices: Vec<(Point3, NodeId)> = Vec::new();
    let mut vertex_for = |p: Point3, store: &mut EntityStore| {
        if let Some((_, id)) = vertices.iter().find(|(q, _)| tol.points_coincident(q, &p)) {
            return *id;
        }
        let id = store.insert(TopoNode::Vertex { point: p });
        vertices.push((p, id));
        id
    };
    let mut edges = Vec::with_capacity(segments.len());
    for (a, b) in segments {
        let start = vertex_for(a, store);
        let end = vertex_for(b, store);
        let edge = store.insert(TopoNode::Edge {
            start,
            end,
            curve: EdgeCurve::Line,
        });
        edges.push((edge, Orientation::Forward));
    }
    Ok(store.insert(TopoNode::Wire { edges }))
}
