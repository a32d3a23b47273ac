/*!
 * Lifecycle Kernel Library
 * Process identity, parent/child bookkeeping and the exit/wait rendezvous
 * of a teaching kernel, hosted on OS threads
 */

pub mod arch;
pub mod core;
pub mod kernel;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod syscalls;

// Re-exports
pub use arch::{MipsContextCloner, TrapFrame};
pub use crate::core::config::KernelConfig;
pub use crate::core::errors::{KernelError, ProcessError, ScheduleError};
pub use crate::core::types::{Address, ExitCode, KernelResult, Pid, Signal};
pub use kernel::{Kernel, KernelSnapshot};
pub use memory::{AddressSpace, MemoryError, MemoryManager, MemoryStats};
pub use monitoring::init_tracing;
pub use process::{
    ExitReason, Exited, LifecycleState, Process, ProcessInfo, ProcessManager, ProcessTable,
    ThreadScheduler, WaitOptions, WaitStatus,
};
pub use syscalls::{Errno, SyscallDispatcher, UserContext};
