pub mod brep;
pub mod primitives;

pub use brep::{EdgeCurve, EntityStore, NodeId, Occurrence, Orientation, TopoKind, TopoNode};

/// Errors raised while constructing or walking topology.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("node not found: {node:?}")]
    NodeNotFound { node: NodeId },

    #[error("expected a {expected:?}, found a {found:?}")]
    WrongKind { expected: TopoKind, found: TopoKind },

    #[error("degenerate wire: {reason}")]
    DegenerateWire { reason: String },

    #[error("degenerate box: size {size:?}")]
    DegenerateBox { size: [f64; 3] },

    #[error("compound has no children")]
    EmptyCompound,
}
