/*!
 * Process Traits
 * Collaborators the lifecycle core consumes but does not implement
 */

use super::object::Process;
use crate::arch::TrapFrame;
use crate::core::errors::ScheduleError;
use crate::core::types::Pid;
use crate::memory::{AddressSpace, MemoryResult};
use std::sync::Arc;

/// Code a freshly scheduled process runs on its own thread
///
/// Receives the process and the register state it resumes with.
pub type ThreadEntry = Box<dyn FnOnce(Arc<Process>, TrapFrame) + Send + 'static>;

/// Address-space creation, duplication and release
pub trait AddressSpaceManager: Send + Sync {
    /// Create a zeroed address space of `pages` pages
    fn create(&self, pages: usize) -> MemoryResult<AddressSpace>;

    /// Deep-copy `source` into a new address space
    fn duplicate(&self, source: &AddressSpace) -> MemoryResult<AddressSpace>;

    /// Return an address space's pages to the pool
    fn destroy(&self, space: AddressSpace);
}

/// Derives a child's saved context from its parent's
pub trait ContextCloner: Send + Sync {
    /// The child must observe a successful call returning 0
    fn clone_for_child(&self, parent: &TrapFrame) -> TrapFrame;
}

/// Makes new processes runnable
pub trait ProcessScheduler: Send + Sync {
    /// Start `process` running `entry` with `frame`
    ///
    /// On error nothing was started and the caller still owns all cleanup.
    fn schedule_new(
        &self,
        process: Arc<Process>,
        frame: TrapFrame,
        entry: ThreadEntry,
    ) -> Result<(), ScheduleError>;

    /// A process has terminated and will not run again
    fn process_exited(&self, _pid: Pid) {}
}
