/*!
 * User Context
 *
 * What a simulated user program sees: a library-style wrapper per call that
 * loads the registers, traps into the dispatcher and turns `a3`/`v0` back
 * into a `Result`. Programs end by giving up their context to `exit`.
 */

use super::dispatcher::SyscallDispatcher;
use super::types::{Dispatch, Errno, SyscallNumber};
use crate::arch::TrapFrame;
use crate::core::types::{Address, ExitCode, Pid};
use crate::process::{ExitReason, Exited, Process, ThreadEntry, WaitOptions, WaitStatus, SIGABRT};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// A user program; it runs until it hands back the token from `exit`
pub type UserProgram = Box<dyn FnOnce(UserContext) -> Exited + Send + 'static>;

const WORD: Address = std::mem::size_of::<i32>();

/// Execution context of one user process
pub struct UserContext {
    dispatcher: SyscallDispatcher,
    process: Arc<Process>,
    frame: TrapFrame,
}

impl UserContext {
    pub(crate) fn new(
        dispatcher: SyscallDispatcher,
        process: Arc<Process>,
        frame: TrapFrame,
    ) -> Self {
        Self {
            dispatcher,
            process,
            frame,
        }
    }

    #[inline]
    pub fn process(&self) -> &Arc<Process> {
        &self.process
    }

    /// Registers as of the last return from the kernel
    #[inline]
    pub fn frame(&self) -> &TrapFrame {
        &self.frame
    }

    fn trap(
        &mut self,
        number: SyscallNumber,
        args: [i64; 3],
        program: Option<UserProgram>,
    ) -> Result<i64, Errno> {
        self.frame.set_call(number.code(), args);
        match self
            .dispatcher
            .dispatch(&self.process, &mut self.frame, program)
        {
            Dispatch::Returned if self.frame.failed() => {
                Err(Errno::from_code(self.frame.v0).unwrap_or(Errno::ENOSYS))
            }
            Dispatch::Returned => Ok(self.frame.v0),
            // Killed by the kernel: unwind out of the program
            Dispatch::Exited(exited) => panic::resume_unwind(Box::new(exited)),
        }
    }

    /// Create a child running `child`; returns the child's identifier
    pub fn fork<F>(&mut self, child: F) -> Result<Pid, Errno>
    where
        F: FnOnce(UserContext) -> Exited + Send + 'static,
    {
        let program: UserProgram = Box::new(child);
        self.trap(SyscallNumber::Fork, [0; 3], Some(program))
            .map(|pid| pid as Pid)
    }

    pub fn getpid(&mut self) -> Result<Pid, Errno> {
        self.trap(SyscallNumber::GetPid, [0; 3], None)
            .map(|pid| pid as Pid)
    }

    /// Wait for child `pid`, receiving its status through the user stack
    pub fn waitpid(
        &mut self,
        pid: Pid,
        options: WaitOptions,
    ) -> Result<(Pid, WaitStatus), Errno> {
        let slot = self.status_slot()?;
        let reaped = self.waitpid_raw(i64::from(pid), slot, options)?;
        let status = self.read_word(slot)?;
        Ok((reaped, WaitStatus::from_raw(status)))
    }

    /// waitpid with an explicit status address; 0 discards the status
    pub fn waitpid_raw(
        &mut self,
        pid: i64,
        status: Address,
        options: WaitOptions,
    ) -> Result<Pid, Errno> {
        let args = [pid, status as i64, i64::from(options.bits())];
        self.trap(SyscallNumber::WaitPid, args, None)
            .map(|pid| pid as Pid)
    }

    pub fn read_word(&self, address: Address) -> Result<i32, Errno> {
        self.process
            .with_address_space(|space| space.read_i32(address))
            .ok_or(Errno::EFAULT)?
            .map_err(|_| Errno::EFAULT)
    }

    pub fn write_word(&mut self, address: Address, value: i32) -> Result<(), Errno> {
        self.process
            .with_address_space_mut(|space| space.write_i32(address, value))
            .ok_or(Errno::EFAULT)?
            .map_err(|_| Errno::EFAULT)
    }

    /// Word just below the stack pointer
    fn status_slot(&self) -> Result<Address, Errno> {
        usize::try_from(self.frame.sp)
            .ok()
            .and_then(|sp| sp.checked_sub(WORD))
            .ok_or(Errno::EFAULT)
    }

    /// Terminate this process with `code`
    pub fn exit(mut self, code: ExitCode) -> Exited {
        self.frame
            .set_call(SyscallNumber::Exit.code(), [i64::from(code), 0, 0]);
        match self
            .dispatcher
            .dispatch(&self.process, &mut self.frame, None)
        {
            Dispatch::Exited(exited) => exited,
            Dispatch::Returned => {
                warn!(pid = ?self.process.pid(), "Exit returned to user code");
                self.dispatcher
                    .manager()
                    .terminate(&self.process, ExitReason::Exited(code))
            }
        }
    }
}

/// Wrap `program` into a thread entry for the scheduler
///
/// However the program ends, the process is terminated exactly once: a
/// program that panics, or returns without having exited, is torn down as
/// if killed by `SIGABRT`.
pub fn launcher(dispatcher: SyscallDispatcher, program: UserProgram) -> ThreadEntry {
    Box::new(move |process: Arc<Process>, frame: TrapFrame| {
        let context = UserContext::new(dispatcher.clone(), Arc::clone(&process), frame);
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || program(context)));

        if process.has_exited() {
            if let Ok(exited) = outcome {
                debug!(pid = ?exited.pid(), reason = ?exited.reason(), "User program finished");
            }
            return;
        }

        match outcome {
            Ok(_) => warn!(pid = ?process.pid(), "User program returned without exiting"),
            Err(_) => warn!(pid = ?process.pid(), "User program panicked"),
        }
        let _ = dispatcher
            .manager()
            .terminate(&process, ExitReason::Signaled(SIGABRT));
    })
}
