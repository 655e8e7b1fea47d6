use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use joinery_kernel::geometry::{Isometry3, UnitQuaternion};
use joinery_kernel::topology::primitives::box_corner;
use joinery_kernel::{Point3, Vector3};
use kernel_bridge::{BrepKernel, ShapeHandle};
use topo_index::{Geometries, IndexConfig, RootShape};

use crate::error::PartError;

/// Stable identifier of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub Uuid);

impl PartId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn check_size(size: &Vector3) -> Result<(), PartError> {
    if size.iter().all(|s| s.is_finite() && *s >= 0.0) {
        Ok(())
    } else {
        Err(PartError::NegativeSize {
            size: [size.x, size.y, size.z],
        })
    }
}

/// Placement and size of a part, for restoring after a cancelled edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartSnapshot {
    pub position: Point3,
    pub orientation: UnitQuaternion,
    pub size: Vector3,
}

/// The kernel box last built for a part and the size it was built at.
#[derive(Debug, Clone, Copy)]
struct BuiltBox {
    handle: ShapeHandle,
    size: Vector3,
}

/// A rectangular board.
///
/// The board spans `[0, size]` in its local frame; `position` is where the
/// local origin (the min corner) lands in the world and `orientation` turns
/// the local axes. Any setter invalidates the derived geometry, which is
/// rebuilt on the next [`Part::geometries`] call.
#[derive(Debug)]
pub struct Part {
    id: PartId,
    name: String,
    position: Point3,
    orientation: UnitQuaternion,
    size: Vector3,
    built: BuiltBox,
    root: RootShape,
}

impl Part {
    /// Create an axis-aligned part and its kernel box.
    #[instrument(skip(kernel))]
    pub fn new(kernel: &mut dyn BrepKernel, name: &str, position: Point3, size: Vector3) -> Result<Self, PartError> {
        check_size(&size)?;
        let id = PartId::new();
        info!(%id, "creating part");
        let placement = Isometry3::translation(position.x, position.y, position.z);
        let handle = kernel.make_box(size)?.located(placement);
        let root = RootShape::from_shape(&*kernel, handle)?;
        Ok(Self {
            id,
            name: name.to_string(),
            position,
            orientation: UnitQuaternion::identity(),
            size,
            built: BuiltBox { handle, size },
            root,
        })
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn orientation(&self) -> UnitQuaternion {
        self.orientation
    }

    pub fn size(&self) -> Vector3 {
        self.size
    }

    /// Local-to-world transform.
    pub fn placement(&self) -> Isometry3 {
        Isometry3::from_parts(self.position.coords.into(), self.orientation)
    }

    pub fn to_local(&self, world: &Point3) -> Point3 {
        self.placement().inverse_transform_point(world)
    }

    pub fn to_local_vector(&self, world: &Vector3) -> Vector3 {
        self.orientation.inverse_transform_vector(world)
    }

    pub fn center(&self) -> Point3 {
        self.placement() * Point3::from(self.size / 2.0)
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_position(&mut self, position: Point3) {
        self.position = position;
        self.root.invalidate();
    }

    pub fn set_orientation(&mut self, orientation: UnitQuaternion) {
        self.orientation = orientation;
        self.root.invalidate();
    }

    pub fn set_size(&mut self, size: Vector3) -> Result<(), PartError> {
        check_size(&size)?;
        self.size = size;
        self.root.invalidate();
        Ok(())
    }

    pub fn snapshot(&self) -> PartSnapshot {
        PartSnapshot {
            position: self.position,
            orientation: self.orientation,
            size: self.size,
        }
    }

    pub fn restore(&mut self, snapshot: &PartSnapshot) -> Result<(), PartError> {
        self.set_size(snapshot.size)?;
        self.set_position(snapshot.position);
        self.set_orientation(snapshot.orientation);
        Ok(())
    }

    /// Corner `index` of the board.
    pub fn vertex(&self, index: usize) -> Result<PartVertex, PartError> {
        PartVertex::new(index)
    }

    pub fn vertices(&self) -> [Point3; 8] {
        std::array::from_fn(|i| PartVertex { index: i }.world_position(self))
    }

    pub fn is_built(&self) -> bool {
        self.root.is_built()
    }

    pub fn root(&self) -> &RootShape {
        &self.root
    }

    pub fn cached_geometries(&self) -> Option<&Arc<Geometries>> {
        self.root.cached_geometries()
    }

    /// Geometries for the current placement and size.
    ///
    /// A placement change reuses the kernel box under a new location; a size
    /// change replaces the box and releases the old one.
    #[instrument(skip(self, kernel, config), fields(part = %self.id))]
    pub fn geometries(&mut self, kernel: &mut dyn BrepKernel, config: &IndexConfig) -> Result<Arc<Geometries>, PartError> {
        let placement = self.placement();
        if self.built.size != self.size {
            let handle = kernel.make_box(self.size)?.located(placement);
            if let Err(err) = kernel.release(&self.built.handle) {
                // The old box stays current; the replacement must not outlive this call.
                if let Err(cleanup) = kernel.release(&handle) {
                    warn!(error = %cleanup, "could not free replacement box");
                }
                return Err(err.into());
            }
            self.built = BuiltBox {
                handle,
                size: self.size,
            };
            self.root.set_shape(&*kernel, handle)?;
            debug!("replaced part box");
        } else if self.built.handle.location() != &placement || self.root.handle() != Some(&self.built.handle) {
            self.built.handle = self.built.handle.located(placement);
            self.root.set_shape(&*kernel, self.built.handle)?;
        }
        Ok(self.root.geometries(kernel, config)?)
    }

    /// Free the part's kernel shape.
    pub fn release(self, kernel: &mut dyn BrepKernel) -> Result<(), PartError> {
        kernel.release(&self.built.handle)?;
        Ok(())
    }
}

/// One of the eight corners of a part.
///
/// Bit 0 of the index selects the max x side, bit 1 max y, bit 2 max z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartVertex {
    index: usize,
}

impl PartVertex {
    pub fn new(index: usize) -> Result<Self, PartError> {
        if index < 8 {
            Ok(Self { index })
        } else {
            Err(PartError::InvalidCornerIndex { index })
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Corner position in the part's local frame.
    pub fn local_position(&self, size: &Vector3) -> Point3 {
        box_corner(size, self.index)
    }

    pub fn world_position(&self, part: &Part) -> Point3 {
        part.placement() * self.local_position(&part.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kernel_bridge::ArenaKernel;

    use crate::testing::FaultyKernel;

    fn board(kernel: &mut ArenaKernel) -> Part {
        Part::new(kernel, "shelf", Point3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 0.5, 2.0)).unwrap()
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut kernel = ArenaKernel::new();
        let err = Part::new(&mut kernel, "bad", Point3::origin(), Vector3::new(1.0, -1.0, 1.0)).unwrap_err();
        assert!(matches!(err, PartError::NegativeSize { .. }));
        let mut part = board(&mut kernel);
        assert!(part.set_size(Vector3::new(f64::NAN, 1.0, 1.0)).is_err());
        assert_eq!(part.size(), Vector3::new(4.0, 0.5, 2.0));
    }

    #[test]
    fn test_vertex_positions_follow_transform() {
        let mut kernel = ArenaKernel::new();
        let mut part = board(&mut kernel);
        assert_eq!(part.vertex(0).unwrap().world_position(&part), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(part.vertex(7).unwrap().world_position(&part), Point3::new(5.0, 2.5, 5.0));
        assert!(matches!(part.vertex(8), Err(PartError::InvalidCornerIndex { index: 8 })));

        part.set_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2));
        // +x of the board now points along -z.
        let corner = part.vertex(1).unwrap().world_position(&part);
        assert_relative_eq!(corner, Point3::new(1.0, 2.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_setters_invalidate_geometry() {
        let mut kernel = ArenaKernel::new();
        let mut part = board(&mut kernel);
        let config = IndexConfig::default();
        part.geometries(&mut kernel, &config).unwrap();
        assert!(part.is_built());
        part.set_position(Point3::new(0.0, 0.0, 0.0));
        assert!(!part.is_built());
        let g = part.geometries(&mut kernel, &config).unwrap();
        let max_x = g.faces.positions().chunks(3).map(|p| p[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 4.0);
    }

    #[test]
    fn test_resize_replaces_kernel_box() {
        let mut kernel = ArenaKernel::new();
        let mut part = board(&mut kernel);
        let config = IndexConfig::default();
        part.geometries(&mut kernel, &config).unwrap();
        let nodes = kernel.node_count();
        part.set_size(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        part.geometries(&mut kernel, &config).unwrap();
        // The old box was released, so the arena holds one box either way.
        assert_eq!(kernel.node_count(), nodes);

        part.set_position(Point3::new(9.0, 9.0, 9.0));
        part.geometries(&mut kernel, &config).unwrap();
        assert_eq!(kernel.node_count(), nodes);
    }

    #[test]
    fn test_zero_thickness_part_still_builds() {
        let mut kernel = ArenaKernel::new();
        let mut part = board(&mut kernel);
        part.set_size(Vector3::new(4.0, 0.0, 2.0)).unwrap();
        let g = part.geometries(&mut kernel, &IndexConfig::default()).unwrap();
        assert_eq!(g.faces.triangle_count(), 4);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut kernel = ArenaKernel::new();
        let mut part = board(&mut kernel);
        let snapshot = part.snapshot();
        part.set_position(Point3::new(-1.0, 0.0, 0.0));
        part.set_size(Vector3::new(9.0, 9.0, 9.0)).unwrap();
        part.restore(&snapshot).unwrap();
        assert_eq!(part.snapshot(), snapshot);
    }

    #[test]
    fn test_release_frees_nodes() {
        let mut kernel = ArenaKernel::new();
        let part = board(&mut kernel);
        assert_eq!(kernel.node_count(), 34);
        part.release(&mut kernel).unwrap();
        assert_eq!(kernel.node_count(), 0);
    }

    #[test]
    fn test_failed_release_keeps_old_box_and_frees_new() {
        let mut kernel = FaultyKernel::new();
        let config = IndexConfig::default();
        let mut part = board(&mut kernel.inner);
        part.geometries(&mut kernel, &config).unwrap();
        let live = kernel.inner.node_count();

        part.set_size(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        kernel.release_failures = 1;
        assert!(matches!(part.geometries(&mut kernel, &config), Err(PartError::Kernel(_))));
        assert_eq!(kernel.inner.node_count(), live);

        let g = part.geometries(&mut kernel, &config).unwrap();
        assert_eq!(g.faces.triangle_count(), 12);
        assert_eq!(kernel.inner.node_count(), live);
    }
}
