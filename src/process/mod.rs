/*!
 * Process Module
 * Process identity, parent/child bookkeeping and the exit/wait rendezvous
 */

pub mod manager;
pub mod manager_builder;
pub mod object;
pub mod record;
pub mod scheduler;
pub mod table;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use manager::ProcessManager;
pub use manager_builder::ProcessManagerBuilder;
pub use object::Process;
pub use record::LifecycleRecord;
pub use scheduler::{SchedulerStats, ThreadScheduler};
pub use table::ProcessTable;
pub use traits::{AddressSpaceManager, ContextCloner, ProcessScheduler, ThreadEntry};
pub use types::{
    ExitReason, Exited, LifecycleState, ProcessInfo, ProcessResult, WaitKind, WaitOptions,
    WaitStatus, SIGABRT,
};
