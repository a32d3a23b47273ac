/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::{Address, Pid};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export MemoryError from memory module
pub use crate::memory::MemoryError;

/// Process lifecycle errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process table full: all {capacity} identifiers are in use")]
    #[diagnostic(
        code(process::resource_exhausted),
        help("Collect finished children to release their identifiers.")
    )]
    ResourceExhausted { capacity: usize },

    #[error("Out of memory: requested {requested} pages, {available} available")]
    #[diagnostic(
        code(process::out_of_memory),
        help("The simulated page budget is exhausted. Let processes exit first.")
    )]
    OutOfMemory { requested: usize, available: usize },

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(process::invalid_argument))]
    InvalidArgument(String),

    #[error("No such process: {0}")]
    #[diagnostic(
        code(process::no_such_process),
        help("The process may already have been collected or never existed.")
    )]
    NoSuchProcess(Pid),

    #[error("Process {pid} is not a child of process {caller}")]
    #[diagnostic(
        code(process::not_a_child),
        help("Only the parent that spawned a process may collect it.")
    )]
    NotAChild { pid: Pid, caller: Pid },

    #[error("Bad user address 0x{address:x}")]
    #[diagnostic(code(process::fault))]
    Fault { address: Address },

    #[error("Scheduling failed: {0}")]
    #[diagnostic(code(process::scheduling_failed))]
    SchedulingFailed(String),

    #[error("Lifecycle invariant violated: {0}")]
    #[diagnostic(
        code(process::invariant_violation),
        help("This is a kernel bug, not a user error.")
    )]
    InvariantViolation(String),
}

impl From<MemoryError> for ProcessError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfMemory {
                requested,
                available,
                ..
            } => ProcessError::OutOfMemory {
                requested,
                available,
            },
            MemoryError::Fault { address, .. } => ProcessError::Fault { address },
        }
    }
}

impl From<ScheduleError> for ProcessError {
    fn from(err: ScheduleError) -> Self {
        ProcessError::SchedulingFailed(err.to_string())
    }
}

/// Scheduling collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Failed to start thread for PID {pid}: {reason}")]
    SpawnFailed { pid: Pid, reason: String },

    #[error("Scheduler is shutting down")]
    ShuttingDown,
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Scheduler error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(kernel::config),
        help("Check KERNEL_* environment variables or the config file.")
    )]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
