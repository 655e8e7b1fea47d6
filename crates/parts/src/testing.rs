//! Kernel wrapper with switchable faults for exercising error paths.

use joinery_kernel::geometry::{Plane, Point3, Vector3};
use kernel_bridge::{
    ArenaKernel, BrepKernel, CurveKind, DistanceResult, FaceTriangulation, KernelError, PolygonOnTriangulation,
    ShapeHandle, ShapeIdentity, ShapeKind,
};

/// Delegates to an [`ArenaKernel`] unless a fault is armed.
#[derive(Default)]
pub struct FaultyKernel {
    pub inner: ArenaKernel,
    pub fail_make_box: bool,
    /// Number of upcoming `release` calls that fail.
    pub release_failures: usize,
}

impl FaultyKernel {
    pub fn new() -> Self {
        Self::default()
    }
}

fn injected(operation: &str) -> KernelError {
    KernelError::NotDone {
        operation: format!("{operation} (injected)"),
    }
}

impl BrepKernel for FaultyKernel {
    fn make_box(&mut self, size: Vector3) -> Result<ShapeHandle, KernelError> {
        if self.fail_make_box {
            return Err(injected("make_box"));
        }
        self.inner.make_box(size)
    }

    fn make_polyline(&mut self, points: &[Point3], closed: bool) -> Result<ShapeHandle, KernelError> {
        self.inner.make_polyline(points, closed)
    }

    fn make_arc(
        &mut self,
        center: Point3,
        start: Point3,
        end: Point3,
        normal: Vector3,
    ) -> Result<ShapeHandle, KernelError> {
        self.inner.make_arc(center, start, end, normal)
    }

    fn make_compound(&mut self, children: &[ShapeHandle]) -> Result<ShapeHandle, KernelError> {
        self.inner.make_compound(children)
    }

    fn release(&mut self, shape: &ShapeHandle) -> Result<(), KernelError> {
        if self.release_failures > 0 {
            self.release_failures -= 1;
            return Err(injected("release"));
        }
        self.inner.release(shape)
    }

    fn triangulate(&mut self, shape: &ShapeHandle, linear_deflection: f64) -> Result<(), KernelError> {
        self.inner.triangulate(shape, linear_deflection)
    }

    fn face_triangulation(&self, face: &ShapeHandle) -> Option<FaceTriangulation> {
        self.inner.face_triangulation(face)
    }

    fn polygon_on_triangulation(&self, edge: &ShapeHandle, face: &ShapeHandle) -> Option<PolygonOnTriangulation> {
        self.inner.polygon_on_triangulation(edge, face)
    }

    fn shape_kind(&self, shape: &ShapeHandle) -> Result<ShapeKind, KernelError> {
        self.inner.shape_kind(shape)
    }

    fn explore(&self, shape: &ShapeHandle, kind: ShapeKind) -> Result<Vec<ShapeHandle>, KernelError> {
        self.inner.explore(shape, kind)
    }

    fn identity(&self, shape: &ShapeHandle) -> ShapeIdentity {
        self.inner.identity(shape)
    }

    fn vertex_point(&self, vertex: &ShapeHandle) -> Result<Point3, KernelError> {
        self.inner.vertex_point(vertex)
    }

    fn edge_curve(&self, edge: &ShapeHandle) -> Result<CurveKind, KernelError> {
        self.inner.edge_curve(edge)
    }

    fn face_plane(&self, face: &ShapeHandle) -> Result<Plane, KernelError> {
        self.inner.face_plane(face)
    }

    fn distance(&self, a: &ShapeHandle, b: &ShapeHandle) -> Result<DistanceResult, KernelError> {
        self.inner.distance(a, b)
    }

    fn section(&mut self, shape: &ShapeHandle, plane: &Plane) -> Result<ShapeHandle, KernelError> {
        self.inner.section(shape, plane)
    }
}
