use kernel_bridge::{KernelError, ShapeKind};

use crate::topology::EntityRef;

/// Errors from indexing a shape or reading its buffers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("{buffer} map has {map} entries for {primitives} primitives")]
    MapLengthMismatch {
        buffer: &'static str,
        primitives: usize,
        map: usize,
    },

    #[error("{buffer} index {index} out of bounds for {len} vertices")]
    IndexOutOfBounds {
        buffer: &'static str,
        index: u32,
        len: usize,
    },

    #[error("{buffer} buffer is malformed: {reason}")]
    MalformedBuffer { buffer: &'static str, reason: String },

    #[error("entity {entity:?} is not indexed")]
    EntityNotIndexed { entity: EntityRef },

    #[error("wire contains a curved edge; only straight wire edges can be indexed")]
    CurvedWireUnsupported,

    #[error("a {kind:?} cannot be indexed as a root shape")]
    UnsupportedRoot { kind: ShapeKind },
}
