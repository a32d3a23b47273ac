/*!
 * Syscalls Module
 * Dispatch boundary between user programs and the lifecycle core
 */

pub mod dispatcher;
pub mod types;
pub mod user;

// Re-export public API
pub use dispatcher::SyscallDispatcher;
pub use types::{Dispatch, Errno, Syscall, SyscallNumber};
pub use user::{launcher, UserContext, UserProgram};
