/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Exit code passed to `_exit`
pub type ExitCode = i32;

/// Signal number reported in a wait status
pub type Signal = u32;

/// User-space virtual address
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;
