/*!
 * Process Types
 * Common types for process lifecycle management
 */

use crate::core::errors::ProcessError;
use crate::core::types::{ExitCode, Pid, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process operation result
///
/// # Must Use
/// Spawn failures must be handled; partial resources are already released
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Abnormal-termination signal used when a user program dies without exiting
pub const SIGABRT: Signal = 6;

/// Why a process stopped running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ExitReason {
    /// Called `_exit` with this code
    Exited(ExitCode),
    /// Torn down by the kernel
    Signaled(Signal),
}

/// Lifecycle state of a registered process
///
/// The exit reason only exists once the process has finished, so nobody can
/// read it early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum LifecycleState {
    Running,
    Finished(ExitReason),
}

impl LifecycleState {
    #[inline(always)]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, LifecycleState::Finished(_))
    }

    #[inline]
    #[must_use]
    pub const fn exit_reason(&self) -> Option<ExitReason> {
        match self {
            LifecycleState::Finished(reason) => Some(*reason),
            LifecycleState::Running => None,
        }
    }
}

// Low two bits of a wait status say what happened, the rest carries the value
const WAIT_EXITED: i32 = 0;
const WAIT_SIGNALED: i32 = 1;
const WAIT_CORED: i32 = 2;
const WAIT_STOPPED: i32 = 3;

/// What a wait status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    Exited,
    Signaled,
    CoreDumped,
    Stopped,
}

/// Encoded exit status as delivered to the collecting parent
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitStatus(i32);

impl WaitStatus {
    /// Normal exit with `code`
    #[inline]
    pub const fn exited(code: ExitCode) -> Self {
        Self(code.wrapping_shl(2) | WAIT_EXITED)
    }

    /// Killed by `signal`
    #[inline]
    pub const fn signaled(signal: Signal) -> Self {
        Self((signal as i32).wrapping_shl(2) | WAIT_SIGNALED)
    }

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn kind(self) -> WaitKind {
        match self.0 & 3 {
            WAIT_EXITED => WaitKind::Exited,
            WAIT_SIGNALED => WaitKind::Signaled,
            WAIT_CORED => WaitKind::CoreDumped,
            _ => WaitKind::Stopped,
        }
    }

    #[inline]
    const fn value(self) -> i32 {
        // Arithmetic shift keeps negative exit codes intact
        self.0 >> 2
    }

    /// Exit code, if the process exited normally
    pub const fn exit_code(self) -> Option<ExitCode> {
        match self.kind() {
            WaitKind::Exited => Some(self.value()),
            _ => None,
        }
    }

    /// Terminating signal, if the process was killed
    pub const fn term_signal(self) -> Option<Signal> {
        match self.kind() {
            WaitKind::Signaled | WaitKind::CoreDumped => Some(self.value() as Signal),
            _ => None,
        }
    }
}

impl From<ExitReason> for WaitStatus {
    fn from(reason: ExitReason) -> Self {
        match reason {
            ExitReason::Exited(code) => WaitStatus::exited(code),
            ExitReason::Signaled(signal) => WaitStatus::signaled(signal),
        }
    }
}

impl fmt::Debug for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            WaitKind::Exited => write!(f, "WaitStatus(exited {})", self.value()),
            WaitKind::Signaled => write!(f, "WaitStatus(signal {})", self.value()),
            WaitKind::CoreDumped => write!(f, "WaitStatus(core {})", self.value()),
            WaitKind::Stopped => write!(f, "WaitStatus(stopped {})", self.value()),
        }
    }
}

/// Options word passed to waitpid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitOptions(i32);

impl WaitOptions {
    /// Block until the child finishes
    pub const NONE: WaitOptions = WaitOptions(0);
    /// Return immediately if the child is still running (not supported)
    pub const WNOHANG: WaitOptions = WaitOptions(1);
    /// Also report stopped children (not supported)
    pub const WUNTRACED: WaitOptions = WaitOptions(2);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Only the blocking default is accepted
    pub fn validate(self) -> ProcessResult<()> {
        if self == Self::NONE {
            Ok(())
        } else {
            Err(ProcessError::InvalidArgument(format!(
                "unsupported wait options 0x{:x}",
                self.0
            )))
        }
    }
}

/// Read-only view of one process table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Pid>,
    pub state: LifecycleState,
}

impl ProcessInfo {
    #[inline(always)]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

/// Proof that a process has terminated
///
/// Only `ProcessManager::terminate` creates one, and user code gets it by
/// giving up its context, so a user program cannot keep running after exit.
#[derive(Debug)]
#[must_use = "return the token from the user program"]
pub struct Exited {
    pid: Option<Pid>,
    reason: ExitReason,
}

impl Exited {
    pub(crate) const fn new(pid: Option<Pid>, reason: ExitReason) -> Self {
        Self { pid, reason }
    }

    #[inline]
    pub const fn pid(&self) -> Option<Pid> {
        self.pid
    }

    #[inline]
    pub const fn reason(&self) -> ExitReason {
        self.reason
    }
}
