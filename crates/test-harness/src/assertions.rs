//! Assertion helpers with diagnostic output.
//!
//! Every failure names the context and shows expected vs actual values.

use joinery_kernel::{Point3, Vector3};
use target_finder::Target;
use topo_index::{Geometries, Intersection};

use crate::helpers::{entity_counts, hit_kind, HarnessError};

fn failed(detail: String) -> HarnessError {
    HarnessError::AssertionFailed { detail }
}

/// Assert two points agree within `tol`.
pub fn assert_point_near(actual: &Point3, expected: &Point3, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let off = nalgebra::distance(actual, expected);
    if off <= tol {
        Ok(())
    } else {
        Err(failed(format!(
            "[{ctx}] expected point ({:.6}, {:.6}, {:.6}), got ({:.6}, {:.6}, {:.6}), off by {off:.3e} (tol={tol})",
            expected.x, expected.y, expected.z, actual.x, actual.y, actual.z,
        )))
    }
}

/// Assert two vectors agree within `tol`.
pub fn assert_vector_near(actual: &Vector3, expected: &Vector3, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let off = (actual - expected).norm();
    if off <= tol {
        Ok(())
    } else {
        Err(failed(format!(
            "[{ctx}] expected vector ({:.6}, {:.6}, {:.6}), got ({:.6}, {:.6}, {:.6})",
            expected.x, expected.y, expected.z, actual.x, actual.y, actual.z,
        )))
    }
}

/// Assert a pick landed on a face, edge or vertex.
pub fn assert_hit_kind<K>(hit: &Intersection<K>, expected: &str, ctx: &str) -> Result<(), HarnessError> {
    let actual = hit_kind(hit);
    if actual == expected {
        Ok(())
    } else {
        Err(failed(format!(
            "[{ctx}] expected {expected} hit, got {actual} at ({:.4}, {:.4}, {:.4})",
            hit.point.x, hit.point.y, hit.point.z,
        )))
    }
}

/// Assert a target snapped onto `expected`.
pub fn assert_snapped_point(target: &Target, expected: &Point3, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let Some(snapped) = target.snapped_point else {
        return Err(failed(format!(
            "[{ctx}] expected a point snap, got {}",
            describe_target(target)
        )));
    };
    assert_point_near(&snapped, expected, tol, ctx)?;
    assert_point_near(&target.point, expected, tol, ctx)
}

/// Assert a target snapped onto a line but not a point.
pub fn assert_snapped_line(target: &Target, ctx: &str) -> Result<(), HarnessError> {
    if target.snapped_line.is_some() && target.snapped_point.is_none() {
        Ok(())
    } else {
        Err(failed(format!(
            "[{ctx}] expected a line snap, got {}",
            describe_target(target)
        )))
    }
}

/// Assert a target carries no snap.
pub fn assert_unsnapped(target: &Target, ctx: &str) -> Result<(), HarnessError> {
    if target.snapped_line.is_none() && target.snapped_point.is_none() {
        Ok(())
    } else {
        Err(failed(format!("[{ctx}] expected no snap, got {}", describe_target(target))))
    }
}

/// Assert exact (faces, edges, vertices) counts for a geometry bundle.
pub fn assert_entity_counts(
    geometries: &Geometries,
    expected_f: usize,
    expected_e: usize,
    expected_v: usize,
    ctx: &str,
) -> Result<(), HarnessError> {
    let (f, e, v) = entity_counts(geometries);
    if (f, e, v) == (expected_f, expected_e, expected_v) {
        Ok(())
    } else {
        Err(failed(format!(
            "[{ctx}] expected F={expected_f} E={expected_e} V={expected_v}, got F={f} E={e} V={v}",
        )))
    }
}

fn describe_target(target: &Target) -> String {
    let p = target.point;
    let snap = match (target.snapped_point, target.snapped_line) {
        (Some(_), _) => "point snap",
        (None, Some(_)) => "line snap",
        (None, None) => "no snap",
    };
    format!("target ({:.4}, {:.4}, {:.4}) with {snap}", p.x, p.y, p.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_near_reports_context() {
        let err = assert_point_near(&Point3::new(1.0, 0.0, 0.0), &Point3::origin(), 1e-6, "corner").unwrap_err();
        assert!(err.to_string().contains("[corner]"));
        assert!(assert_point_near(&Point3::origin(), &Point3::new(0.0, 1e-9, 0.0), 1e-6, "corner").is_ok());
    }

    #[test]
    fn test_target_snaps() {
        let target = Target {
            point: Point3::new(1.0, 2.0, 3.0),
            snapped_point: None,
            snapped_line: None,
            plane: None,
        };
        assert!(assert_unsnapped(&target, "free").is_ok());
        assert!(assert_snapped_line(&target, "free").is_err());
        let err = assert_snapped_point(&target, &target.point, 1e-9, "free").unwrap_err();
        assert!(err.to_string().contains("no snap"));
    }
}
