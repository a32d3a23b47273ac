/*!
 * Syscall Types
 * Call numbers, the numeric error domain and decoded call requests
 */

use super::user::UserProgram;
use crate::arch::TrapFrame;
use crate::core::errors::ProcessError;
use crate::core::types::{Address, ExitCode, Pid};
use crate::process::{Exited, WaitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// System call numbers understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i64)]
pub enum SyscallNumber {
    Fork = 0,
    Exit = 3,
    WaitPid = 4,
    GetPid = 5,
}

impl SyscallNumber {
    #[inline]
    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn name(self) -> &'static str {
        match self {
            SyscallNumber::Fork => "fork",
            SyscallNumber::Exit => "_exit",
            SyscallNumber::WaitPid => "waitpid",
            SyscallNumber::GetPid => "getpid",
        }
    }
}

impl TryFrom<i64> for SyscallNumber {
    type Error = Errno;

    fn try_from(callno: i64) -> Result<Self, Errno> {
        match callno {
            0 => Ok(SyscallNumber::Fork),
            3 => Ok(SyscallNumber::Exit),
            4 => Ok(SyscallNumber::WaitPid),
            5 => Ok(SyscallNumber::GetPid),
            _ => Err(Errno::ENOSYS),
        }
    }
}

/// Error numbers returned to user code in `v0`
#[allow(clippy::upper_case_acronyms)]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum Errno {
    #[error("function not implemented")]
    ENOSYS = 1,
    #[error("out of memory")]
    ENOMEM = 3,
    #[error("bad memory reference")]
    EFAULT = 6,
    #[error("invalid argument")]
    EINVAL = 8,
    #[error("too many processes in system")]
    ENPROC = 12,
    #[error("no such process")]
    ESRCH = 15,
    #[error("no child processes")]
    ECHILD = 16,
}

impl Errno {
    #[inline]
    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn from_code(code: i64) -> Option<Errno> {
        match code {
            1 => Some(Errno::ENOSYS),
            3 => Some(Errno::ENOMEM),
            6 => Some(Errno::EFAULT),
            8 => Some(Errno::EINVAL),
            12 => Some(Errno::ENPROC),
            15 => Some(Errno::ESRCH),
            16 => Some(Errno::ECHILD),
            _ => None,
        }
    }
}

impl From<&ProcessError> for Errno {
    fn from(err: &ProcessError) -> Self {
        match err {
            ProcessError::ResourceExhausted { .. } => Errno::ENPROC,
            ProcessError::OutOfMemory { .. } => Errno::ENOMEM,
            ProcessError::InvalidArgument(_) => Errno::EINVAL,
            ProcessError::NoSuchProcess(_) => Errno::ESRCH,
            ProcessError::NotAChild { .. } => Errno::ECHILD,
            ProcessError::Fault { .. } => Errno::EFAULT,
            ProcessError::SchedulingFailed(_) => Errno::ENOMEM,
            ProcessError::InvariantViolation(_) => Errno::EINVAL,
        }
    }
}

impl From<ProcessError> for Errno {
    fn from(err: ProcessError) -> Self {
        Errno::from(&err)
    }
}

/// A decoded system call request
pub enum Syscall {
    /// Duplicate the caller; the child runs `entry`
    Fork { entry: UserProgram },
    Exit { code: ExitCode },
    GetPid,
    /// `status` of 0 means the caller does not want the status
    WaitPid {
        pid: Pid,
        status: Address,
        options: WaitOptions,
    },
}

impl Syscall {
    /// Decode the request held in `frame`
    ///
    /// `program` is the code a forked child runs; only fork consumes it.
    /// Wait targets outside the identifier range decode to 0, which never
    /// names a process.
    pub fn decode(frame: &TrapFrame, program: Option<UserProgram>) -> Result<Syscall, Errno> {
        let call = match SyscallNumber::try_from(frame.v0)? {
            SyscallNumber::Fork => Syscall::Fork {
                entry: program.ok_or(Errno::EINVAL)?,
            },
            // The exit code is a C int; `_exit` cannot fail, so only the
            // low 32 bits count
            SyscallNumber::Exit => Syscall::Exit {
                code: frame.a0 as ExitCode,
            },
            SyscallNumber::GetPid => Syscall::GetPid,
            SyscallNumber::WaitPid => Syscall::WaitPid {
                pid: Pid::try_from(frame.a0).unwrap_or(0),
                status: user_pointer(frame.a1),
                // Options is a C int too, but a word outside int range is
                // never a valid flag set
                options: i32::try_from(frame.a2)
                    .map(WaitOptions::from_bits)
                    .map_err(|_| Errno::EINVAL)?,
            },
        };
        Ok(call)
    }

    pub const fn number(&self) -> SyscallNumber {
        match self {
            Syscall::Fork { .. } => SyscallNumber::Fork,
            Syscall::Exit { .. } => SyscallNumber::Exit,
            Syscall::GetPid => SyscallNumber::GetPid,
            Syscall::WaitPid { .. } => SyscallNumber::WaitPid,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.number().name()
    }
}

impl fmt::Debug for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syscall::Fork { .. } => f.write_str("Fork"),
            Syscall::Exit { code } => f.debug_struct("Exit").field("code", code).finish(),
            Syscall::GetPid => f.write_str("GetPid"),
            Syscall::WaitPid {
                pid,
                status,
                options,
            } => f
                .debug_struct("WaitPid")
                .field("pid", pid)
                .field("status", &format_args!("0x{:x}", status))
                .field("options", options)
                .finish(),
        }
    }
}

/// Reinterpret a pointer register as a user address
///
/// Bits that do not fit an address become `usize::MAX`, which no address
/// space maps, so they fault instead of reading as null.
fn user_pointer(register: i64) -> Address {
    usize::try_from(register as u64).unwrap_or(usize::MAX)
}

/// How a dispatched call left the caller
#[derive(Debug)]
pub enum Dispatch {
    /// Result written to the frame; the caller resumes
    Returned,
    /// The caller is gone and must not run again
    Exited(Exited),
}
