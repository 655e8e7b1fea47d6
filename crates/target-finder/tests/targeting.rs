//! Target resolution against picks on real indexed geometry.

use std::sync::Arc;

use approx::assert_relative_eq;
use proptest::prelude::*;

use joinery_kernel::geometry::Isometry3;
use joinery_kernel::{Plane, Point3, Ray, Vector3};
use kernel_bridge::{ArenaKernel, BrepKernel};
use target_finder::{Constraint, TargetFinder};
use topo_index::{Geometries, IndexConfig, Raycaster, RootShape};

const PIXEL: f64 = 0.001;

/// A unit cube spanning `[2, 3]` on every axis, clear of the world axes.
fn cube() -> Arc<Geometries> {
    let mut kernel = ArenaKernel::new();
    let shape = kernel
        .make_box(Vector3::new(1.0, 1.0, 1.0))
        .unwrap()
        .located(Isometry3::translation(2.0, 2.0, 2.0));
    let mut root = RootShape::from_shape(&kernel, shape).unwrap();
    root.geometries(&mut kernel, &IndexConfig::default()).unwrap()
}

fn down(x: f64, z: f64) -> Ray {
    Ray::new(Point3::new(x, 10.0, z), -Vector3::y()).unwrap()
}

fn resolve(finder: &TargetFinder, g: &Geometries, ray: &Ray) -> Option<target_finder::Target> {
    let picked = Raycaster::default().pick_with_snap(ray, PIXEL, [(0usize, g)]);
    finder.find_target(ray, PIXEL, picked.as_ref())
}

// ---------------------------------------------------------------------------
// Precedence on a cube
// ---------------------------------------------------------------------------

#[test]
fn corner_pick_snaps_to_vertex() {
    let g = cube();
    let target = resolve(&TargetFinder::default(), &g, &down(2.997, 2.998)).unwrap();
    assert_eq!(target.snapped_point, Some(Point3::new(3.0, 3.0, 3.0)));
    assert!(target.snapped_line.is_none());
}

#[test]
fn edge_pick_snaps_to_edge_line() {
    let g = cube();
    let target = resolve(&TargetFinder::default(), &g, &down(2.996, 2.5)).unwrap();
    let line = target.snapped_line.unwrap();
    assert_relative_eq!(line.direction.z.abs(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(target.point, Point3::new(3.0, 3.0, 2.5), epsilon = 1e-5);
}

#[test]
fn face_pick_reports_face_plane() {
    let g = cube();
    let target = resolve(&TargetFinder::default(), &g, &down(2.4, 2.6)).unwrap();
    assert!(target.snapped_point.is_none() && target.snapped_line.is_none());
    assert_relative_eq!(target.point, Point3::new(2.4, 3.0, 2.6), epsilon = 1e-5);
    assert_relative_eq!(target.plane.unwrap().normal, Vector3::y(), epsilon = 1e-6);
}

#[test]
fn empty_space_falls_back_to_ground_plane() {
    let g = cube();
    let target = resolve(&TargetFinder::default(), &g, &down(-4.0, 6.0)).unwrap();
    assert_relative_eq!(target.point, Point3::new(-4.0, 0.0, 6.0), epsilon = 1e-9);
}

#[test]
fn vertical_constraint_plane_ignores_face_hit() {
    let g = cube();
    let anchor = Point3::new(2.5, 0.0, 0.0);
    let mut finder = TargetFinder::default();
    finder.set_constraint(Constraint::OnPlane {
        plane: Plane::new(anchor, Vector3::x()).unwrap(),
        anchor,
    });
    // A straight-down ray is parallel to the plane x = 2.5 and misses it.
    assert!(resolve(&finder, &g, &down(2.4, 2.6)).is_none());
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn repeated_resolution_is_identical(
        ox in -10.0f64..10.0, oz in -10.0f64..10.0,
        dx in -0.5f64..0.5, dz in -0.5f64..0.5,
        pixel in 1e-4f64..1e-2,
    ) {
        let g = cube();
        let finder = TargetFinder::default();
        let ray = Ray::new(Point3::new(ox, 10.0, oz), Vector3::new(dx, -1.0, dz)).unwrap();
        let picked = Raycaster::default().pick_with_snap(&ray, pixel, [(0usize, g.as_ref())]);
        let first = finder.find_target(&ray, pixel, picked.as_ref());
        let second = finder.find_target(&ray, pixel, picked.as_ref());
        prop_assert_eq!(first, second);
    }
}
