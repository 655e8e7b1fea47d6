//! End-to-end editor scenarios through the Workbench.
//!
//! Each scenario builds parts, frames them, and drives picking, targeting
//! and dragging the way pointer input would.

use joinery_kernel::Point3;
use joinery_parts::{Camera, DragKind, StretchMode};
use target_finder::Constraint;
use test_harness::assertions::*;
use test_harness::helpers::{down_ray, point, ray};
use test_harness::Workbench;

const PIXEL: f64 = 0.001;

/// A unit cube centred on the origin, already framed.
fn unit_cube() -> Workbench {
    let mut w = Workbench::new().with_auto_frame();
    w.centered_board("cube", [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
    w
}

// ── Scenario 1: Snap to a corner just outside the cube ──────────────────

#[test]
fn test_vertex_snap_outside_silhouette() {
    let w = unit_cube();
    let threshold = w.scene().config().pick.point_threshold_pixels * PIXEL;
    let ray = down_ray(0.5 + threshold, 0.5).unwrap();

    let hit = w.pick(&ray, PIXEL).unwrap();
    assert_hit_kind(&hit, "vertex", "corner pick").unwrap();

    let target = w.target(&ray, PIXEL).unwrap();
    assert_snapped_point(&target, &Point3::new(0.5, 0.5, 0.5), 1e-6, "corner target").unwrap();
    assert!(target.snapped_line.is_none());
}

// ── Scenario 2: Snap to an edge near the top face border ────────────────

#[test]
fn test_edge_snap_on_face_border() {
    let w = unit_cube();
    let ray = down_ray(0.495, 0.0).unwrap();

    let hit = w.pick(&ray, PIXEL).unwrap();
    assert_hit_kind(&hit, "edge", "border pick").unwrap();

    let target = w.target(&ray, PIXEL).unwrap();
    assert_snapped_line(&target, "border target").unwrap();
    assert_point_near(&target.point, &Point3::new(0.5, 0.5, 0.0), 1e-6, "border target").unwrap();
}

// ── Scenario 3: Stretch the +x face, then cancel ────────────────────────

#[test]
fn test_stretch_face_then_cancel() {
    let mut w = unit_cube();
    let grab = ray([10.0, 0.1, 0.2], [-1.0, 0.0, 0.0]).unwrap();
    let hit = w
        .grab(&grab, PIXEL, DragKind::Stretch(StretchMode::OppositeFixed))
        .unwrap();
    assert_hit_kind(&hit, "face", "grab").unwrap();
    assert_point_near(&hit.point, &Point3::new(0.5, 0.1, 0.2), 1e-6, "grab").unwrap();

    // The face travels along its normal only.
    let target = w.drag_to(&down_ray(5.5, 0.2).unwrap(), PIXEL).unwrap();
    assert_point_near(&target.point, &Point3::new(5.5, 0.1, 0.2), 1e-6, "drag").unwrap();
    w.assert_size("cube", [6.0, 1.0, 1.0], 1e-6).unwrap();
    w.assert_position("cube", [-0.5, -0.5, -0.5], 1e-9).unwrap();

    w.cancel_drag().unwrap();
    w.assert_size("cube", [1.0, 1.0, 1.0], 0.0).unwrap();
    w.assert_position("cube", [-0.5, -0.5, -0.5], 0.0).unwrap();
    assert_eq!(*w.scene().finder().constraint(), Constraint::None);
    assert!(!w.scene().is_dragging());
}

#[test]
fn test_stretch_is_kept_and_rebuilt() {
    let mut w = unit_cube();
    let grab = ray([10.0, 0.1, 0.2], [-1.0, 0.0, 0.0]).unwrap();
    w.grab(&grab, PIXEL, DragKind::Stretch(StretchMode::OppositeFixed))
        .unwrap();
    w.drag_to(&down_ray(2.5, 0.2).unwrap(), PIXEL).unwrap();
    w.release().unwrap();

    w.assert_size("cube", [3.0, 1.0, 1.0], 1e-6).unwrap();
    w.assert_box_topology("cube").unwrap();
    // Picking sees the stretched geometry.
    let hit = w.pick(&down_ray(2.0, 0.1).unwrap(), PIXEL).unwrap();
    assert_hit_kind(&hit, "face", "stretched top").unwrap();
    assert_point_near(&hit.point, &Point3::new(2.0, 0.5, 0.1), 1e-6, "stretched top").unwrap();
}

// ── Scenario 4: Move a part over another one ────────────────────────────

#[test]
fn test_move_ignores_dragged_part() {
    let mut w = Workbench::new();
    w.centered_board("base", [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
    w.board("rail", [3.0, -0.5, -0.5], [1.0, 1.0, 1.0]).unwrap();
    w.frame().unwrap();
    let rail = w.part_id("rail").unwrap();

    let hit = w.grab(&down_ray(3.5, 0.0).unwrap(), PIXEL, DragKind::Move).unwrap();
    assert_eq!(hit.object, rail);

    // The pointer passes over the base; the rail slides in its top plane.
    let target = w.drag_to(&down_ray(0.2, 0.1).unwrap(), PIXEL).unwrap();
    assert_unsnapped(&target, "over base").unwrap();
    assert_point_near(&target.point, &Point3::new(0.2, 0.5, 0.1), 1e-6, "over base").unwrap();
    w.release().unwrap();

    w.assert_position("rail", [-0.3, -0.5, -0.4], 1e-6).unwrap();
    w.assert_position("base", [-0.5, -0.5, -0.5], 0.0).unwrap();
    let frame = w.frame().unwrap();
    assert_eq!(frame.rebuilt, vec![rail]);
    assert_eq!(*w.scene().finder().constraint(), Constraint::None);
}

// ── Scenario 5: Draw two points on a board ──────────────────────────────

#[test]
fn test_collect_points_on_board() {
    let mut w = Workbench::new().with_auto_frame();
    w.board("panel", [0.0, 0.0, 0.0], [4.0, 1.0, 4.0]).unwrap();

    let rays = [down_ray(1.3, 2.7).unwrap(), down_ray(3.0, 2.705).unwrap()];
    let points = w.collect_points(&rays, PIXEL).unwrap();
    assert_eq!(points.len(), 2);
    assert_point_near(&points[0], &Point3::new(1.3, 1.0, 2.7), 1e-6, "first").unwrap();
    // The second point snaps onto the x line through the first.
    assert_point_near(&points[1], &Point3::new(3.0, 1.0, 2.7), 1e-6, "second").unwrap();
    assert_eq!(*w.scene().finder().constraint(), Constraint::None);
}

// ── Scenario 6: Pointer rays from a top-down camera ─────────────────────

#[test]
fn test_camera_pointer_pick() {
    let camera = Camera {
        up: -joinery_kernel::Vector3::z(),
        ..Camera::orthographic(point([0.0, 10.0, 0.0]), Point3::origin(), 6.0, 600.0, 600.0)
    };
    let mut w = Workbench::new().with_camera(camera);
    w.centered_board("cube", [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).unwrap();
    w.frame().unwrap();

    let (ray, pixel) = w.pointer(330.0, 320.0).unwrap();
    assert!((pixel - 0.01).abs() < 1e-12);
    let hit = w.pick(&ray, pixel).unwrap();
    assert_hit_kind(&hit, "face", "pointer").unwrap();

    let target = w.target(&ray, pixel).unwrap();
    assert_unsnapped(&target, "pointer").unwrap();
    assert_point_near(&target.point, &Point3::new(0.3, 0.5, 0.2), 1e-6, "pointer").unwrap();
    assert!(target.plane.is_some());
}
