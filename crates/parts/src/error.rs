use kernel_bridge::KernelError;
use topo_index::IndexError;

use crate::part::PartId;

/// Errors from building, editing or looking up parts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("part size must be finite and non-negative, got {size:?}")]
    NegativeSize { size: [f64; 3] },

    #[error("corner index {index} out of range (a part has 8 corners)")]
    InvalidCornerIndex { index: usize },

    #[error("part not found: {id}")]
    UnknownPart { id: PartId },
}
