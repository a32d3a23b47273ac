/*!
 * Syscall Dispatcher
 *
 * Decodes a trap frame, runs the request against the process manager and
 * writes the outcome back using the register convention: `v0` holds the
 * result or error number, `a3` is 0 on success and 1 on failure, and the
 * program counter steps past the call instruction.
 */

use super::types::{Dispatch, Errno, Syscall};
use super::user::{self, UserProgram};
use crate::arch::TrapFrame;
use crate::core::errors::ProcessError;
use crate::core::types::Address;
use crate::memory::MemoryError;
use crate::monitoring::SyscallSpan;
use crate::process::{ExitReason, Process, ProcessManager, ProcessResult, WaitStatus, SIGABRT};
use std::sync::Arc;
use tracing::{debug, error};

/// Entry point from user code into the lifecycle core
#[derive(Debug, Clone)]
pub struct SyscallDispatcher {
    manager: Arc<ProcessManager>,
}

impl SyscallDispatcher {
    pub fn new(manager: Arc<ProcessManager>) -> Self {
        Self { manager }
    }

    #[inline]
    pub fn manager(&self) -> &Arc<ProcessManager> {
        &self.manager
    }

    /// Handle the call described by `frame`
    pub fn dispatch(
        &self,
        caller: &Arc<Process>,
        frame: &mut TrapFrame,
        program: Option<UserProgram>,
    ) -> Dispatch {
        match Syscall::decode(frame, program) {
            Ok(call) => self.execute(caller, frame, call),
            Err(errno) => {
                debug!(pid = ?caller.pid(), callno = frame.v0, %errno, "Rejected syscall");
                frame.set_error(errno.code());
                frame.advance();
                Dispatch::Returned
            }
        }
    }

    /// Run an already decoded call
    pub fn execute(&self, caller: &Arc<Process>, frame: &mut TrapFrame, call: Syscall) -> Dispatch {
        let pid = caller.pid().unwrap_or_default();
        let span = SyscallSpan::new(call.name(), pid);
        let _entered = span.enter();

        let result: ProcessResult<i64> = match call {
            Syscall::Exit { code } => {
                return Dispatch::Exited(self.manager.terminate(caller, ExitReason::Exited(code)));
            }
            Syscall::GetPid => self.manager.get_pid(caller).map(i64::from),
            Syscall::Fork { entry } => {
                let parent_frame = *frame;
                self.manager
                    .spawn(caller, &parent_frame, user::launcher(self.clone(), entry))
                    .map(i64::from)
            }
            Syscall::WaitPid {
                pid: target,
                status,
                options,
            } => self
                .manager
                .collect_with(caller, target, options, |ws| deliver_status(caller, status, ws))
                .map(|(reaped, _)| i64::from(reaped)),
        };

        match result {
            Ok(value) => {
                span.record_return(value);
                frame.set_return(value);
            }
            Err(ProcessError::InvariantViolation(message)) => {
                // The caller cannot be trusted to continue
                error!(pid, "Killing process after kernel fault: {}", message);
                return Dispatch::Exited(
                    self.manager
                        .terminate(caller, ExitReason::Signaled(SIGABRT)),
                );
            }
            Err(e) => {
                let errno = Errno::from(&e);
                span.record_errno(errno.code());
                debug!(pid, %errno, "Syscall failed: {}", e);
                frame.set_error(errno.code());
            }
        }
        frame.advance();
        Dispatch::Returned
    }
}

/// Copy an encoded status to user memory; a null address skips delivery
fn deliver_status(caller: &Process, address: Address, status: WaitStatus) -> ProcessResult<()> {
    if address == 0 {
        return Ok(());
    }
    caller
        .with_address_space_mut(|space| space.write_i32(address, status.raw()))
        .unwrap_or(Err(MemoryError::Fault {
            address,
            len: std::mem::size_of::<i32>(),
        }))
        .map_err(ProcessError::from)
}
