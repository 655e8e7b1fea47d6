//! Boundary between the editor core and the B-rep kernel: the [`BrepKernel`]
//! trait, the handle and identity types crossing it, and the arena-backed
//! implementation used by the editor and its tests.

pub mod arena_kernel;
pub mod session;
pub mod traits;
pub mod types;

pub use arena_kernel::ArenaKernel;
pub use session::KernelSession;
pub use traits::*;
pub use types::*;
