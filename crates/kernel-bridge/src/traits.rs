use joinery_kernel::geometry::{Plane, Point3, Vector3};

use crate::types::*;

/// B-rep kernel boundary consumed by the indexer, the pickers and the parts.
///
/// Implemented by [`ArenaKernel`](crate::ArenaKernel). Components receive
/// the kernel explicitly; there is no process-wide instance.
pub trait BrepKernel {
    // ─── Construction ───────────────────────────────────────────────────

    /// Box solid spanning `[0, size]` on each local axis.
    fn make_box(&mut self, size: Vector3) -> Result<ShapeHandle, KernelError>;

    /// Wire of straight edges through `points`.
    fn make_polyline(&mut self, points: &[Point3], closed: bool) -> Result<ShapeHandle, KernelError>;

    /// Single-edge wire holding a circular arc.
    fn make_arc(
        &mut self,
        center: Point3,
        start: Point3,
        end: Point3,
        normal: Vector3,
    ) -> Result<ShapeHandle, KernelError>;

    /// Compound owning the given shapes.
    fn make_compound(&mut self, children: &[ShapeHandle]) -> Result<ShapeHandle, KernelError>;

    /// Free a shape and its sub-shapes. Handles into it become invalid.
    fn release(&mut self, shape: &ShapeHandle) -> Result<(), KernelError>;

    // ─── Meshing ────────────────────────────────────────────────────────

    /// Triangulate every face of `shape` at the given linear deflection,
    /// storing one record per face.
    fn triangulate(&mut self, shape: &ShapeHandle, linear_deflection: f64) -> Result<(), KernelError>;

    /// Triangulation record of a face, located by the face handle.
    fn face_triangulation(&self, face: &ShapeHandle) -> Option<FaceTriangulation>;

    /// Polyline of `edge` inside the triangulation of `face`.
    fn polygon_on_triangulation(&self, edge: &ShapeHandle, face: &ShapeHandle) -> Option<PolygonOnTriangulation>;

    // ─── Introspection ──────────────────────────────────────────────────

    fn shape_kind(&self, shape: &ShapeHandle) -> Result<ShapeKind, KernelError>;

    /// Every sub-shape of `kind` in visit order. Shared sub-shapes appear once
    /// per occurrence.
    fn explore(&self, shape: &ShapeHandle, kind: ShapeKind) -> Result<Vec<ShapeHandle>, KernelError>;

    fn identity(&self, shape: &ShapeHandle) -> ShapeIdentity;

    /// Both handles denote the same entity, whatever their orientation or
    /// placement.
    fn is_same(&self, a: &ShapeHandle, b: &ShapeHandle) -> bool {
        self.identity(a) == self.identity(b)
    }

    /// World position of a vertex.
    fn vertex_point(&self, vertex: &ShapeHandle) -> Result<Point3, KernelError>;

    fn edge_curve(&self, edge: &ShapeHandle) -> Result<CurveKind, KernelError>;

    /// World plane of a face, with the normal following the handle's
    /// orientation.
    fn face_plane(&self, face: &ShapeHandle) -> Result<Plane, KernelError>;

    // ─── Queries ────────────────────────────────────────────────────────

    fn distance(&self, a: &ShapeHandle, b: &ShapeHandle) -> Result<DistanceResult, KernelError>;

    /// Wire where `plane` cuts `shape`.
    fn section(&mut self, shape: &ShapeHandle, plane: &Plane) -> Result<ShapeHandle, KernelError>;
}
