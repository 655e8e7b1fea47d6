use std::collections::HashMap;

use tracing::{info, instrument};

use super::brep::{EdgeCurve, EntityStore, NodeId, Orientation, TopoNode};
use super::TopologyError;
use crate::geometry::{Plane, Point3, Vector3};

/// Box corner `i`: bit 0 selects max x, bit 1 max y, bit 2 max z.
pub fn box_corner(size: &Vector3, i: usize) -> Point3 {
    Point3::new(
        if i & 1 != 0 { size.x } else { 0.0 },
        if i & 2 != 0 { size.y } else { 0.0 },
        if i & 4 != 0 { size.z } else { 0.0 },
    )
}

/// Corner loops of the six box faces, counter-clockwise seen from outside.
const BOX_FACES: [([usize; 4], [f64; 3]); 6] = [
    ([0, 4, 6, 2], [-1.0, 0.0, 0.0]),
    ([1, 3, 7, 5], [1.0, 0.0, 0.0]),
    ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
    ([2, 6, 7, 3], [0.0, 1.0, 0.0]),
    ([0, 2, 3, 1], [0.0, 0.0, -1.0]),
    ([4, 5, 7, 6], [0.0, 0.0, 1.0]),
];

/// Build a box solid spanning `[0, size]` on each local axis.
///
/// Zero extents are allowed: the collapsed faces simply have no area.
/// Edges are shared between the two faces that bound them, each face using
/// the edge with opposite orientation.
#[instrument(skip(store))]
pub fn make_box(store: &mut EntityStore, size: Vector3) -> Result<NodeId, TopologyError> {
    info!(size = ?[size.x, size.y, size.z], "creating box primitive");
    if !size.iter().all(|s| s.is_finite() && *s >= 0.0) {
        return Err(TopologyError::DegenerateBox {
            size: [size.x, size.y, size.z],
        });
    }

    let vertices: Vec<NodeId> = (0..8)
        .map(|i| store.insert(TopoNode::Vertex { point: box_corner(&size, i) }))
        .collect();

    let mut edges: HashMap<(usize, usize), NodeId> = HashMap::new();
    let mut faces = Vec::with_capacity(6);
    for (corners, normal) in BOX_FACES {
        let mut wire_edges = Vec::with_capacity(4);
        for k in 0..4 {
            let (a, b) = (corners[k], corners[(k + 1) % 4]);
            let key = (a.min(b), a.max(b));
            let edge = *edges.entry(key).or_insert_with(|| {
                store.insert(TopoNode::Edge {
                    start: vertices[key.0],
                    end: vertices[key.1],
                    curve: EdgeCurve::Line,
                })
            });
            let orientation = if a < b {
                Orientation::Forward
            } else {
                Orientation::Reversed
            };
            wire_edges.push((edge, orientation));
        }
        let outer = store.insert(TopoNode::Wire { edges: wire_edges });
        let origin = box_corner(&size, corners[0]);
        let plane = Plane::from_unit(origin, Vector3::from(normal));
        let face = store.insert(TopoNode::Face { plane, outer });
        faces.push((face, Orientation::Forward));
    }

    let shell = store.insert(TopoNode::Shell { faces });
    Ok(store.insert(TopoNode::Solid { shells: vec![shell] }))
}

/// Build a wire of straight edges through `points`, optionally closed.
#[instrument(skip(store, points), fields(points = points.len()))]
pub fn make_polyline(store: &mut EntityStore, points: &[Point3], closed: bool) -> Result<NodeId, TopologyError> {
    if points.len() < 2 {
        return Err(TopologyError::DegenerateWire {
            reason: format!("polyline needs at least 2 points, got {}", points.len()),
        });
    }
    let tol = crate::default_tolerance();
    for pair in points.windows(2) {
        if tol.points_coincident(&pair[0], &pair[1]) {
            return Err(TopologyError::DegenerateWire {
                reason: format!("consecutive points coincide at {:?}", pair[0]),
            });
        }
    }

    let vertices: Vec<NodeId> = points
        .iter()
        .map(|p| store.insert(TopoNode::Vertex { point: *p }))
        .collect();
    let mut segments: Vec<(usize, usize)> = (0..points.len() - 1).map(|i| (i, i + 1)).collect();
    if closed && points.len() > 2 {
        segments.push((points.len() - 1, 0));
    }
    let edges = segments
        .into_iter()
        .map(|(a, b)| {
            let edge = store.insert(TopoNode::Edge {
                start: vertices[a],
                end: vertices[b],
                curve: EdgeCurve::Line,
            });
            (edge, Orientation::Forward)
        })
        .collect();
    Ok(store.insert(TopoNode::Wire { edges }))
}

/// Build a single-edge wire holding a circular arc from `start` to `end`
/// turning counter-clockwise about `normal`.
#[instrument(skip(store))]
pub fn make_arc(
    store: &mut EntityStore,
    center: Point3,
    start: Point3,
    end: Point3,
    normal: Vector3,
) -> Result<NodeId, TopologyError> {
    let tol = crate::default_tolerance();
    let normal = crate::geometry::unit_direction(&normal).ok_or_else(|| TopologyError::DegenerateWire {
        reason: "arc normal has zero length".into(),
    })?;
    let (r0, r1) = ((start - center).norm(), (end - center).norm());
    if tol.is_zero_length(r0) || (r0 - r1).abs() > tol.coincidence.max(r0 * 1e-9) {
        return Err(TopologyError::DegenerateWire {
            reason: format!("arc radii differ or vanish: {r0} vs {r1}"),
        });
    }
    if (start - center).dot(&normal).abs() > tol.coincidence || (end - center).dot(&normal).abs() > tol.coincidence {
        return Err(TopologyError::DegenerateWire {
            reason: "arc end points are not in the arc plane".into(),
        });
    }

    let v0 = store.insert(TopoNode::Vertex { point: start });
    let v1 = if tol.points_coincident(&start, &end) {
        v0
    } else {
        store.insert(TopoNode::Vertex { point: end })
    };
    let edge = store.insert(TopoNode::Edge {
        start: v0,
        end: v1,
        curve: EdgeCurve::Arc { center, normal },
    });
    Ok(store.insert(TopoNode::Wire {
        edges: vec![(edge, Orientation::Forward)],
    }))
}

/// Group existing shapes under a compound. The compound takes ownership of
/// the children's subtrees.
pub fn make_compound(store: &mut EntityStore, children: Vec<NodeId>) -> Result<NodeId, TopologyError> {
    if children.is_empty() {
        return Err(TopologyError::EmptyCompound);
    }
    for &child in &children {
        store.node(child)?;
    }
    Ok(store.insert(TopoNode::Compound { children }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::brep::TopoKind;
    use std::collections::HashSet;

    #[test]
    fn test_box_counts() {
        let mut store = EntityStore::new();
        let solid = make_box(&mut store, Vector3::new(1.0, 2.0, 3.0)).unwrap();
        // 8 vertices + 12 edges + 6 wires + 6 faces + shell + solid
        assert_eq!(store.len(), 34);
        assert_eq!(store.explore(solid, TopoKind::Face).unwrap().len(), 6);
        let edges = store.explore(solid, TopoKind::Edge).unwrap();
        assert_eq!(edges.len(), 24);
        let unique: HashSet<_> = edges.iter().map(|o| o.node).collect();
        assert_eq!(unique.len(), 12);
        let vertices = store.explore(solid, TopoKind::Vertex).unwrap();
        assert_eq!(vertices.len(), 48);
        let unique: HashSet<_> = vertices.iter().map(|o| o.node).collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_box_edges_used_once_each_way() {
        let mut store = EntityStore::new();
        let solid = make_box(&mut store, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let mut uses: HashMap<NodeId, Vec<Orientation>> = HashMap::new();
        for occ in store.explore(solid, TopoKind::Edge).unwrap() {
            uses.entry(occ.node).or_default().push(occ.orientation);
        }
        for orientations in uses.values() {
            assert_eq!(orientations.len(), 2);
            assert_ne!(orientations[0], orientations[1]);
        }
    }

    #[test]
    fn test_box_face_planes_point_outward() {
        let mut store = EntityStore::new();
        let size = Vector3::new(2.0, 3.0, 4.0);
        let solid = make_box(&mut store, size).unwrap();
        let center = Point3::from(size / 2.0);
        for occ in store.explore(solid, TopoKind::Face).unwrap() {
            let TopoNode::Face { plane, .. } = store.node(occ.node).unwrap() else {
                panic!("expected face");
            };
            assert!(plane.signed_distance(&center) < 0.0);
        }
    }

    #[test]
    fn test_box_rejects_negative_size() {
        let mut store = EntityStore::new();
        assert!(make_box(&mut store, Vector3::new(1.0, 0.0, 1.0)).is_ok());
        assert!(matches!(
            make_box(&mut store, Vector3::new(1.0, -0.5, 1.0)),
            Err(TopologyError::DegenerateBox { .. })
        ));
    }

    #[test]
    fn test_polyline_closed_and_open() {
        let mut store = EntityStore::new();
        let pts = [
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let open = make_polyline(&mut store, &pts, false).unwrap();
        let closed = make_polyline(&mut store, &pts, true).unwrap();
        assert_eq!(store.explore(open, TopoKind::Edge).unwrap().len(), 2);
        assert_eq!(store.explore(closed, TopoKind::Edge).unwrap().len(), 3);
        assert!(make_polyline(&mut store, &pts[..1], false).is_err());
        assert!(make_polyline(&mut store, &[pts[0], pts[0]], false).is_err());
    }

    #[test]
    fn test_arc_validation() {
        let mut store = EntityStore::new();
        let ok = make_arc(
            &mut store,
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::z(),
        );
        assert!(ok.is_ok());
        let bad = make_arc(
            &mut store,
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Vector3::z(),
        );
        assert!(bad.is_err());
        let collapsed = make_arc(&mut store, Point3::origin(), Point3::origin(), Point3::origin(), Vector3::z());
        assert!(matches!(collapsed, Err(TopologyError::DegenerateWire { .. })));
    }

    #[test]
    fn test_compound_requires_children() {
        let mut store = EntityStore::new();
        assert!(matches!(make_compound(&mut store, vec![]), Err(TopologyError::EmptyCompound)));
        let b = make_box(&mut store, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let c = make_compound(&mut store, vec![b]).unwrap();
        assert_eq!(store.explore(c, TopoKind::Solid).unwrap().len(), 1);
    }
}
