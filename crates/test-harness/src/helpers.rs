//! Helper functions: error type, ray and point constructors, hit summaries.

use std::collections::HashSet;

use joinery_kernel::{Point3, Ray, Vector3};
use joinery_parts::PartError;
use topo_index::{EntityRef, Geometries, Intersection};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("part not found: {name}")]
    PartNotFound { name: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("nothing picked: {context}")]
    NothingPicked { context: String },

    #[error("no target: {context}")]
    NoTarget { context: String },

    #[error("degenerate ray: {context}")]
    DegenerateRay { context: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("part error: {0}")]
    Part(#[from] PartError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

// ── Points and Rays ─────────────────────────────────────────────────────────

pub fn point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

pub fn vector(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

/// Ray from `origin` along `direction`.
pub fn ray(origin: [f64; 3], direction: [f64; 3]) -> Result<Ray, HarnessError> {
    Ray::new(point(origin), vector(direction)).ok_or_else(|| HarnessError::DegenerateRay {
        context: format!("origin {origin:?} direction {direction:?}"),
    })
}

/// Ray looking straight down onto the XZ plane at `(x, z)`, from `y = 10`.
pub fn down_ray(x: f64, z: f64) -> Result<Ray, HarnessError> {
    ray([x, 10.0, z], [0.0, -1.0, 0.0])
}

/// Ray from `from` through `to`.
pub fn ray_through(from: [f64; 3], to: [f64; 3]) -> Result<Ray, HarnessError> {
    ray(from, [to[0] - from[0], to[1] - from[1], to[2] - from[2]])
}

// ── Hit Summaries ───────────────────────────────────────────────────────────

/// "face", "edge" or "vertex".
pub fn hit_kind<K>(hit: &Intersection<K>) -> &'static str {
    match hit.entity {
        EntityRef::Face(_) => "face",
        EntityRef::Edge(_) => "edge",
        EntityRef::Vertex(_) => "vertex",
    }
}

/// Distinct (faces, edges, vertices) carried by a geometry bundle.
pub fn entity_counts(geometries: &Geometries) -> (usize, usize, usize) {
    let faces: HashSet<_> = geometries.faces.map().iter().collect();
    let edges: HashSet<_> = geometries.edges.map().iter().collect();
    (faces.len(), edges.len(), geometries.vertices.point_count())
}
