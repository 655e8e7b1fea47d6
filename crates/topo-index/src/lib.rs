//! Topology wrappers, render buffers with entity maps, and ray picking over
//! them.
//!
//! A [`RootShape`] wraps one kernel shape (or a point cloud), indexes its
//! faces, edges and vertices once each, and lazily builds a [`Geometries`]
//! bundle whose every render primitive maps back to the entity it came from.

pub mod config;
pub mod error;
pub mod geometries;
pub mod indexer;
pub mod picking;
pub mod topology;

pub use config::{IndexConfig, PickConfig};
pub use error::IndexError;
pub use geometries::{EdgeGeometry, FaceGeometry, Geometries, VertexGeometry};
pub use picking::{HitGeometry, Intersection, Raycaster};
pub use topology::{
    EdgeKey, EdgeNode, EntityRef, FaceKey, FaceNode, ParentRef, RootKind, RootShape, RootSource, TopologyIndex,
    VertexKey, VertexNode,
};
