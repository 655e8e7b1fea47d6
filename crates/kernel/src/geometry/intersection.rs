//! Closed-form intersections and closest-point queries.
//!
//! Degenerate configurations (parallel lines, a line lying in the plane it is
//! tested against, a ray parallel to a plane) are reported as `None`. None of
//! these functions return NaN or infinite coordinates.

use super::{unit_direction, Line, Plane, Point3, Ray};

/// Sines and cosines below this are treated as zero.
const PARALLEL_EPS: f64 = 1e-12;

/// Closest points between two infinite lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoints {
    pub on_first: Point3,
    pub t_first: f64,
    pub on_second: Point3,
    pub t_second: f64,
    pub distance: f64,
}

// ─── Line-Line ───────────────────────────────────────────────────────────────

/// Closest points between two lines; `None` when they are parallel.
pub fn line_line_closest(l1: &Line, l2: &Line) -> Option<ClosestPoints> {
    let w = l1.origin - l2.origin;
    let b = l1.direction.dot(&l2.direction);
    let d = l1.direction.dot(&w);
    let e = l2.direction.dot(&w);

    // Directions are unit length, so a = c = 1.
    let denom = 1.0 - b * b;
    if denom.abs() < PARALLEL_EPS {
        return None;
    }

    let t_first = (b * e - d) / denom;
    let t_second = (e - b * d) / denom;
    let on_first = l1.point_at(t_first);
    let on_second = l2.point_at(t_second);
    Some(ClosestPoints {
        on_first,
        t_first,
        on_second,
        t_second,
        distance: nalgebra::distance(&on_first, &on_second),
    })
}

/// Intersection point of two lines closer than `tol`; `None` for parallel or
/// skew lines.
pub fn line_line_intersection(l1: &Line, l2: &Line, tol: f64) -> Option<Point3> {
    line_line_closest(l1, l2)
        .filter(|c| c.distance < tol)
        .map(|c| nalgebra::center(&c.on_first, &c.on_second))
}

// ─── Line/Ray-Plane ──────────────────────────────────────────────────────────

/// Intersection of a line with a plane, with the line parameter. `None` when
/// the line is parallel to (or lies in) the plane.
pub fn line_plane(line: &Line, plane: &Plane) -> Option<(Point3, f64)> {
    let denom = line.direction.dot(&plane.normal);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = (plane.origin - line.origin).dot(&plane.normal) / denom;
    Some((line.point_at(t), t))
}

/// Intersection of a ray with a plane in front of the ray origin.
pub fn ray_plane(ray: &Ray, plane: &Plane) -> Option<(Point3, f64)> {
    line_plane(&ray.as_line(), plane).filter(|(_, t)| *t >= 0.0)
}

// ─── Plane-Plane ─────────────────────────────────────────────────────────────

/// Intersection line of two planes; `None` when they are parallel.
pub fn plane_plane(a: &Plane, b: &Plane) -> Option<Line> {
    let direction = unit_direction(&a.normal.cross(&b.normal))?;
    // Point on both planes closest to a.origin: solve along the in-plane
    // direction of `a` perpendicular to the intersection line.
    let in_a = direction.cross(&a.normal);
    let denom = in_a.dot(&b.normal);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let s = (b.origin - a.origin).dot(&b.normal) / denom;
    Line::new(a.origin + in_a * s, direction)
}

// ─── Ray-Triangle ────────────────────────────────────────────────────────────

/// Möller–Trumbore ray/triangle test, both windings. Returns the ray
/// parameter of the hit.
pub fn ray_triangle(ray: &Ray, tri: &[Point3; 3]) -> Option<f64> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = ray.direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < PARALLEL_EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&q) * inv_det;
    (t >= 0.0).then_some(t)
}

// ─── Ray-Segment / Segment-Segment ───────────────────────────────────────────

/// Closest approach between a ray and a bounded segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegmentClosest {
    pub on_ray: Point3,
    pub ray_t: f64,
    pub on_segment: Point3,
    /// Segment parameter in `[0, 1]`.
    pub segment_s: f64,
    pub distance: f64,
}

/// Closest points between a ray (`t >= 0`) and the segment `a..b`.
pub fn ray_segment_closest(ray: &Ray, a: &Point3, b: &Point3) -> RaySegmentClosest {
    // A ray is a segment with an unbounded far end; clamp only at t = 0.
    let (t, s) = clamped_closest_params(&ray.origin, &ray.direction, None, a, &(b - a));
    let on_ray = ray.at(t);
    let on_segment = a + (b - a) * s;
    RaySegmentClosest {
        on_ray,
        ray_t: t,
        on_segment,
        segment_s: s,
        distance: nalgebra::distance(&on_ray, &on_segment),
    }
}

/// Closest points between segments `p0..p1` and `q0..q1`.
pub fn segment_segment_closest(p0: &Point3, p1: &Point3, q0: &Point3, q1: &Point3) -> (Point3, Point3) {
    let d1 = p1 - p0;
    let (s, t) = clamped_closest_params(p0, &d1, Some(1.0), q0, &(q1 - q0));
    (p0 + d1 * s, q0 + (q1 - q0) * t)
}

/// Parameters of the closest points between `p + s*d1` (s clamped to
/// `[0, s_max]`, or `[0, inf)` when `s_max` is `None`) and `q + t*d2`
/// (t clamped to `[0, 1]`).
fn clamped_closest_params(
    p: &Point3,
    d1: &nalgebra::Vector3<f64>,
    s_max: Option<f64>,
    q: &Point3,
    d2: &nalgebra::Vector3<f64>,
) -> (f64, f64) {
    let clamp_s = |s: f64| match s_max {
        Some(max) => s.clamp(0.0, max),
        None => s.max(0.0),
    };
    let r = p - q;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(&r);

    if e < PARALLEL_EPS {
        // Degenerate second segment: closest point to q.
        let s = if a < PARALLEL_EPS { 0.0 } else { clamp_s(-d1.dot(&r) / a) };
        return (s, 0.0);
    }
    if a < PARALLEL_EPS {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }

    let b = d1.dot(d2);
    let c = d1.dot(&r);
    let denom = a * e - b * b;
    let mut s = if denom.abs() > PARALLEL_EPS * a * e {
        clamp_s((b * f - c * e) / denom)
    } else {
        // Parallel: any s works, start from the first end.
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = clamp_s(-c / a);
    } else if t > 1.0 {
        t = 1.0;
        s = clamp_s((b - c) / a);
    }
    (s, t)
}

/// Crossing point of segment `a..b` with a plane, if the segment straddles it.
pub fn segment_plane(a: &Point3, b: &Point3, plane: &Plane, tol: f64) -> Option<Point3> {
    let da = plane.signed_distance(a);
    let db = plane.signed_distance(b);
    if da.abs() < tol {
        return Some(*a);
    }
    if db.abs() < tol {
        return Some(*b);
    }
    if da.signum() == db.signum() {
        return None;
    }
    let s = da / (da - db);
    Some(a + (b - a) * s)
}
