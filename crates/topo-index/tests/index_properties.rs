//! Property-based tests for indexing and picking invariants.

use std::collections::HashSet;

use proptest::prelude::*;

use joinery_kernel::geometry::{Isometry3, UnitQuaternion};
use joinery_kernel::{Point3, Ray, Vector3};
use kernel_bridge::{ArenaKernel, BrepKernel};
use topo_index::{EntityRef, IndexConfig, PickConfig, Raycaster, RootShape};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_size() -> impl Strategy<Value = Vector3> {
    (0.1f64..20.0, 0.1f64..20.0, 0.1f64..20.0).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn arb_offset() -> impl Strategy<Value = Vector3> {
    (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn arb_rotation() -> impl Strategy<Value = UnitQuaternion> {
    (-3.1f64..3.1, -3.1f64..3.1, -3.1f64..3.1).prop_map(|(r, p, y)| UnitQuaternion::from_euler_angles(r, p, y))
}

fn arb_polyline() -> impl Strategy<Value = Vec<Point3>> {
    proptest::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 2..12).prop_map(|xy| {
        // Strictly increasing x keeps consecutive points apart.
        xy.into_iter()
            .enumerate()
            .map(|(i, (_, y))| Point3::new(i as f64, y, 0.0))
            .collect()
    })
}

fn indexed_box(kernel: &mut ArenaKernel, size: Vector3, placement: Isometry3) -> RootShape {
    let shape = kernel.make_box(size).unwrap().located(placement);
    RootShape::from_shape(&*kernel, shape).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Every render primitive maps to exactly one indexed entity
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn box_maps_cover_every_primitive(size in arb_size(), at in arb_offset(), rotation in arb_rotation()) {
        let mut kernel = ArenaKernel::new();
        let mut root = indexed_box(&mut kernel, size, Isometry3::from_parts(at.into(), rotation));
        let g = root.geometries(&mut kernel, &IndexConfig::default()).unwrap();
        let topology = root.topology();

        prop_assert_eq!(g.faces.map().len(), g.faces.triangle_count());
        prop_assert_eq!(g.edges.map().len(), g.edges.segment_count());
        prop_assert_eq!(g.vertices.map().len(), g.vertices.point_count());

        for key in g.faces.map() {
            prop_assert!(topology.face(*key).is_some());
        }
        for key in g.edges.map() {
            prop_assert!(topology.edge(*key).is_some());
        }
        for key in g.vertices.map() {
            prop_assert!(topology.vertex(*key).is_some());
        }

        let faces: HashSet<_> = g.faces.map().iter().collect();
        let edges: HashSet<_> = g.edges.map().iter().collect();
        prop_assert_eq!(faces.len(), 6);
        prop_assert_eq!(edges.len(), 12);
        prop_assert_eq!(g.vertices.point_count(), 8);
        prop_assert!(g.edges.shares_positions_with(&g.faces));
    }
}

// ---------------------------------------------------------------------------
// 2. Indexed vertices sit on the placed box corners
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn vertex_positions_are_placed_corners(size in arb_size(), at in arb_offset(), rotation in arb_rotation()) {
        let placement = Isometry3::from_parts(at.into(), rotation);
        let mut kernel = ArenaKernel::new();
        let mut root = indexed_box(&mut kernel, size, placement);
        let g = root.geometries(&mut kernel, &IndexConfig::default()).unwrap();

        let corners: Vec<Point3> = (0..8)
            .map(|i| {
                placement
                    * Point3::new(
                        if i & 1 != 0 { size.x } else { 0.0 },
                        if i & 2 != 0 { size.y } else { 0.0 },
                        if i & 4 != 0 { size.z } else { 0.0 },
                    )
            })
            .collect();
        for i in 0..g.vertices.point_count() {
            let p = g.vertices.point(i).unwrap();
            // Render buffers are f32.
            let nearest = corners
                .iter()
                .map(|c| nalgebra::distance(c, &p))
                .fold(f64::INFINITY, f64::min);
            prop_assert!(nearest < 1e-3, "vertex {p:?} is {nearest} from any corner");
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Wire segments follow the polyline
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn polyline_has_one_segment_per_span(points in arb_polyline()) {
        let mut kernel = ArenaKernel::new();
        let wire = kernel.make_polyline(&points, false).unwrap();
        let mut root = RootShape::from_shape(&kernel, wire).unwrap();
        let g = root.geometries(&mut kernel, &IndexConfig::default()).unwrap();

        prop_assert!(g.faces.map().is_empty());
        prop_assert_eq!(g.edges.segment_count(), points.len() - 1);
        prop_assert_eq!(g.vertices.point_count(), points.len());
        prop_assert_eq!(root.topology().vertex_count(), points.len());
    }
}

// ---------------------------------------------------------------------------
// 4. A ray straight down onto the top face picks that face
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn downward_ray_hits_top_face(size in arb_size(), at in arb_offset(), u in 0.2f64..0.8, w in 0.2f64..0.8) {
        let mut kernel = ArenaKernel::new();
        let mut root = indexed_box(&mut kernel, size, Isometry3::translation(at.x, at.y, at.z));
        let g = root.geometries(&mut kernel, &IndexConfig::default()).unwrap();

        let x = at.x + u * size.x;
        let z = at.z + w * size.z;
        let ray = Ray::new(Point3::new(x, at.y + size.y + 100.0, z), -Vector3::y()).unwrap();
        // A tiny pixel keeps edge and vertex thresholds out of the way.
        let hit = Raycaster::new(PickConfig::default())
            .pick(&ray, 1e-6, [((), g.as_ref())])
            .unwrap();

        prop_assert!(matches!(hit.entity, EntityRef::Face(_)));
        prop_assert!((hit.point.y - (at.y + size.y)).abs() < 1e-3);
        prop_assert!((hit.distance - 100.0).abs() < 1e-3);
    }
}
