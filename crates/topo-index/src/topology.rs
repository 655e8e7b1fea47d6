use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, instrument};

use joinery_kernel::geometry::Point3;
use kernel_bridge::{BrepKernel, KernelError, ShapeHandle, ShapeIdentity, ShapeKind};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::geometries::Geometries;
use crate::indexer;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct FaceKey;
    pub struct EdgeKey;
    pub struct VertexKey;
}

/// Any indexed sub-shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Face(FaceKey),
    Edge(EdgeKey),
    Vertex(VertexKey),
}

/// Enclosing entity of a node, kept as a key so it never owns its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Root,
    Face(FaceKey),
    Edge(EdgeKey),
}

// ─── Sub-shape Nodes ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FaceNode {
    pub handle: ShapeHandle,
    pub parent: ParentRef,
}

#[derive(Debug, Clone)]
pub struct EdgeNode {
    pub handle: ShapeHandle,
    pub parent: ParentRef,
}

/// A vertex with its world position. Point-cloud vertices have no kernel
/// handle.
#[derive(Debug, Clone)]
pub struct VertexNode {
    pub handle: Option<ShapeHandle>,
    pub position: Point3,
    pub parent: ParentRef,
}

// ─── Topology Index ─────────────────────────────────────────────────────────

/// Deduplicated wrappers for every sub-shape reachable from a root.
///
/// A kernel entity gets exactly one wrapper no matter how many times
/// exploration meets it; sameness is decided by the kernel's identity.
#[derive(Debug, Default)]
pub struct TopologyIndex {
    faces: SlotMap<FaceKey, FaceNode>,
    edges: SlotMap<EdgeKey, EdgeNode>,
    vertices: SlotMap<VertexKey, VertexNode>,
    face_ids: HashMap<ShapeIdentity, FaceKey>,
    edge_ids: HashMap<ShapeIdentity, EdgeKey>,
    vertex_ids: HashMap<ShapeIdentity, VertexKey>,
}

impl TopologyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrapper for `handle`, created on first sight.
    pub fn face_for(&mut self, kernel: &dyn BrepKernel, handle: ShapeHandle, parent: ParentRef) -> FaceKey {
        let id = kernel.identity(&handle);
        let faces = &mut self.faces;
        *self
            .face_ids
            .entry(id)
            .or_insert_with(|| faces.insert(FaceNode { handle, parent }))
    }

    pub fn edge_for(&mut self, kernel: &dyn BrepKernel, handle: ShapeHandle, parent: ParentRef) -> EdgeKey {
        let id = kernel.identity(&handle);
        let edges = &mut self.edges;
        *self
            .edge_ids
            .entry(id)
            .or_insert_with(|| edges.insert(EdgeNode { handle, parent }))
    }

    pub fn vertex_for(
        &mut self,
        kernel: &dyn BrepKernel,
        handle: ShapeHandle,
        parent: ParentRef,
    ) -> Result<VertexKey, KernelError> {
        let id = kernel.identity(&handle);
        if let Some(key) = self.vertex_ids.get(&id) {
            return Ok(*key);
        }
        let position = kernel.vertex_point(&handle)?;
        let key = self.vertices.insert(VertexNode {
            handle: Some(handle),
            position,
            parent,
        });
        self.vertex_ids.insert(id, key);
        Ok(key)
    }

    /// A vertex with no kernel counterpart.
    pub fn synthetic_vertex(&mut self, position: Point3) -> VertexKey {
        self.vertices.insert(VertexNode {
            handle: None,
            position,
            parent: ParentRef::Root,
        })
    }

    pub fn face(&self, key: FaceKey) -> Option<&FaceNode> {
        self.faces.get(key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeNode> {
        self.edges.get(key)
    }

    pub fn vertex(&self, key: VertexKey) -> Option<&VertexNode> {
        self.vertices.get(key)
    }

    pub fn face_key(&self, id: ShapeIdentity) -> Option<FaceKey> {
        self.face_ids.get(&id).copied()
    }

    pub fn edge_key(&self, id: ShapeIdentity) -> Option<EdgeKey> {
        self.edge_ids.get(&id).copied()
    }

    pub fn vertex_key(&self, id: ShapeIdentity) -> Option<VertexKey> {
        self.vertex_ids.get(&id).copied()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &FaceNode)> {
        self.faces.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeNode)> {
        self.edges.iter()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &VertexNode)> {
        self.vertices.iter()
    }
}

// ─── Root Shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    Solid,
    Shell,
    Wire,
    Compound,
    PointCloud,
}

/// What a root shape indexes.
#[derive(Debug, Clone)]
pub enum RootSource {
    Shape(ShapeHandle),
    Cloud(Vec<Point3>),
}

/// A self-contained shape owning its topology index and, once built, its
/// geometries bundle.
#[derive(Debug)]
pub struct RootShape {
    kind: RootKind,
    source: RootSource,
    topology: TopologyIndex,
    geometries: Option<Arc<Geometries>>,
}

fn root_kind(kind: ShapeKind) -> Result<RootKind, IndexError> {
    match kind {
        ShapeKind::Solid => Ok(RootKind::Solid),
        ShapeKind::Shell => Ok(RootKind::Shell),
        ShapeKind::Wire => Ok(RootKind::Wire),
        ShapeKind::Compound => Ok(RootKind::Compound),
        other => Err(IndexError::UnsupportedRoot { kind: other }),
    }
}

impl RootShape {
    pub fn from_shape(kernel: &dyn BrepKernel, handle: ShapeHandle) -> Result<Self, IndexError> {
        let kind = root_kind(kernel.shape_kind(&handle)?)?;
        Ok(Self {
            kind,
            source: RootSource::Shape(handle),
            topology: TopologyIndex::new(),
            geometries: None,
        })
    }

    pub fn point_cloud(points: Vec<Point3>) -> Self {
        Self {
            kind: RootKind::PointCloud,
            source: RootSource::Cloud(points),
            topology: TopologyIndex::new(),
            geometries: None,
        }
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn source(&self) -> &RootSource {
        &self.source
    }

    pub fn handle(&self) -> Option<&ShapeHandle> {
        match &self.source {
            RootSource::Shape(handle) => Some(handle),
            RootSource::Cloud(_) => None,
        }
    }

    /// Point at a new kernel shape. Cached geometries are dropped.
    pub fn set_shape(&mut self, kernel: &dyn BrepKernel, handle: ShapeHandle) -> Result<(), IndexError> {
        self.kind = root_kind(kernel.shape_kind(&handle)?)?;
        self.source = RootSource::Shape(handle);
        self.invalidate();
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.geometries = None;
    }

    pub fn is_built(&self) -> bool {
        self.geometries.is_some()
    }

    pub fn topology(&self) -> &TopologyIndex {
        &self.topology
    }

    pub fn cached_geometries(&self) -> Option<&Arc<Geometries>> {
        self.geometries.as_ref()
    }

    /// Geometries for the current shape, building them first when stale.
    ///
    /// A build produces a fresh topology index and bundle which replace the
    /// old ones together; a failed build leaves the previous state intact.
    #[instrument(skip(self, kernel, config), fields(kind = ?self.kind))]
    pub fn geometries(&mut self, kernel: &mut dyn BrepKernel, config: &IndexConfig) -> Result<Arc<Geometries>, IndexError> {
        if let Some(geometries) = &self.geometries {
            return Ok(Arc::clone(geometries));
        }
        let (topology, geometries) = indexer::build(kernel, &self.source, config)?;
        let geometries = Arc::new(geometries);
        self.topology = topology;
        self.geometries = Some(Arc::clone(&geometries));
        debug!("swapped in rebuilt geometries");
        Ok(geometries)
    }
}
