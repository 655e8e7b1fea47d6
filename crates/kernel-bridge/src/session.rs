use tracing::info;

use crate::arena_kernel::ArenaKernel;
use crate::traits::BrepKernel;

/// Owner of the kernel for one editor session.
///
/// Created once by the host; components borrow the kernel from it rather
/// than reaching for a global.
pub struct KernelSession {
    kernel: Box<dyn BrepKernel>,
}

impl KernelSession {
    /// Set up a session over the in-workspace arena kernel.
    pub fn init() -> Self {
        info!("initialising arena kernel session");
        Self::with_kernel(Box::new(ArenaKernel::new()))
    }

    /// Set up a session over any kernel implementation.
    pub fn with_kernel(kernel: Box<dyn BrepKernel>) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &dyn BrepKernel {
        self.kernel.as_ref()
    }

    pub fn kernel_mut(&mut self) -> &mut dyn BrepKernel {
        self.kernel.as_mut()
    }
}

impl std::fmt::Debug for KernelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSession").finish_non_exhaustive()
    }
}
