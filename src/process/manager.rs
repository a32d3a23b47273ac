/*!
 * Process Management
 *
 * Spawn, terminate, collect and identity queries against the process
 * table. Lock order is always table lock, then record lock; the only
 * blocking wait parks on a record monitor with no table lock held.
 */

use super::manager_builder::ProcessManagerBuilder;
use super::object::Process;
use super::record::{ParentRelease, Retirement};
use super::table::ProcessTable;
use super::traits::{AddressSpaceManager, ContextCloner, ProcessScheduler, ThreadEntry};
use super::types::{ExitReason, Exited, ProcessInfo, ProcessResult, WaitOptions, WaitStatus};
use crate::arch::TrapFrame;
use crate::core::errors::ProcessError;
use crate::core::types::Pid;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle coordinator
pub struct ProcessManager {
    pub(super) table: Arc<ProcessTable>,
    pub(super) memory: Arc<dyn AddressSpaceManager>,
    pub(super) cloner: Arc<dyn ContextCloner>,
    pub(super) scheduler: Arc<dyn ProcessScheduler>,
}

impl ProcessManager {
    /// Create a builder for ProcessManager
    pub fn builder() -> ProcessManagerBuilder {
        ProcessManagerBuilder::new()
    }

    /// Register a process with no parent, such as the first user process
    pub fn register_root(&self, process: &Arc<Process>) -> ProcessResult<Pid> {
        let pid = self.table.allocate(process, None)?;
        info!(pid, name = process.name(), "Registered root process");
        Ok(pid)
    }

    /// Create a child of `caller` that resumes from a copy of `frame`
    ///
    /// On any failure every partial resource is released and no record
    /// remains.
    pub fn spawn(
        &self,
        caller: &Arc<Process>,
        frame: &TrapFrame,
        entry: ThreadEntry,
    ) -> ProcessResult<Pid> {
        let parent = self.get_pid(caller)?;
        let child = Process::new(caller.name());

        let space = caller
            .with_address_space(|space| self.memory.duplicate(space))
            .ok_or_else(|| {
                invariant_violation(format!("PID {} has no address space to copy", parent))
            })?
            .map_err(|e| {
                warn!(parent, "Spawn failed copying address space: {}", e);
                ProcessError::from(e)
            })?;
        child.install_address_space(space);

        let pid = match self.table.allocate(&child, Some(parent)) {
            Ok(pid) => pid,
            Err(e) => {
                warn!(parent, "Spawn failed registering child: {}", e);
                self.release_address_space(&child);
                return Err(e);
            }
        };

        let child_frame = self.cloner.clone_for_child(frame);
        if let Err(e) = self
            .scheduler
            .schedule_new(Arc::clone(&child), child_frame, entry)
        {
            warn!(pid, parent, "Spawn failed scheduling child: {}", e);
            self.table.remove(pid);
            self.release_address_space(&child);
            return Err(e.into());
        }

        info!(pid, parent, "Spawned child process");
        Ok(pid)
    }

    /// End `caller` for good
    ///
    /// Publishes the exit reason to a waiting parent, reclaims finished
    /// children, orphans running ones and releases the address space.
    pub fn terminate(&self, caller: &Arc<Process>, reason: ExitReason) -> Exited {
        let pid = caller.pid();
        match pid {
            Some(pid) => self.retire(pid, caller, reason),
            None => warn!(name = caller.name(), "Terminating an unregistered process"),
        }

        self.release_address_space(caller);
        if let Some(pid) = pid {
            self.scheduler.process_exited(pid);
        }
        if caller.mark_exited() {
            info!(pid = ?pid, ?reason, "Process exited");
        } else {
            error!(pid = ?pid, "Process terminated twice");
        }
        Exited::new(pid, reason)
    }

    /// Table half of terminate, all under one acquisition of the table lock
    fn retire(&self, pid: Pid, caller: &Arc<Process>, reason: ExitReason) {
        let mut table = self.table.lock();

        for child in table.children_of(pid) {
            match child.release_from(pid) {
                Some(ParentRelease::Reap) => {
                    table.remove_record(&child);
                    debug!(pid = child.pid(), parent = pid, "Reclaimed uncollected child");
                }
                Some(ParentRelease::Orphaned) => {
                    debug!(pid = child.pid(), parent = pid, "Orphaned running child");
                }
                None => {}
            }
        }

        let Some(record) = table.get(pid).filter(|record| record.belongs_to(caller)) else {
            error!(pid, "Terminating process has no record of its own");
            return;
        };
        match record.retire(reason) {
            Retirement::AwaitingParent => {
                debug!(pid, parent = ?record.parent(), "Exit status published");
            }
            Retirement::Unclaimed => {
                table.remove_record(&record);
                debug!(pid, "No parent waiting; record removed");
            }
            Retirement::AlreadyFinished => {
                error!(pid, "Record finished twice");
            }
        }
    }

    /// Identifier of `caller`
    ///
    /// Fails only if the caller is not a live registered process, which is
    /// a kernel bug.
    pub fn get_pid(&self, caller: &Arc<Process>) -> ProcessResult<Pid> {
        let pid = caller.pid().ok_or_else(|| {
            invariant_violation(format!("process '{}' was never registered", caller.name()))
        })?;
        let record = self
            .table
            .lookup(pid)
            .map_err(|_| invariant_violation(format!("PID {} has no record", pid)))?;
        if !record.belongs_to(caller) {
            return Err(invariant_violation(format!(
                "PID {} is recorded for another process",
                pid
            )));
        }
        if record.is_finished() {
            return Err(invariant_violation(format!(
                "PID {} is running after it finished",
                pid
            )));
        }
        Ok(pid)
    }

    /// Wait for child `target` to finish and reap it
    pub fn collect(
        &self,
        caller: &Arc<Process>,
        target: Pid,
        options: WaitOptions,
    ) -> ProcessResult<(Pid, WaitStatus)> {
        self.collect_with(caller, target, options, |_| Ok(()))
    }

    /// Like `collect`, handing the status to `deliver` before reaping
    ///
    /// If delivery fails the record stays, so the status can be collected
    /// again.
    pub fn collect_with<F>(
        &self,
        caller: &Arc<Process>,
        target: Pid,
        options: WaitOptions,
        deliver: F,
    ) -> ProcessResult<(Pid, WaitStatus)>
    where
        F: FnOnce(WaitStatus) -> ProcessResult<()>,
    {
        options.validate()?;
        let parent = self.get_pid(caller)?;

        let record = self.table.lookup(target)?;
        if record.parent() != Some(parent) {
            return Err(ProcessError::NotAChild {
                pid: target,
                caller: parent,
            });
        }

        debug!(pid = target, parent, "Waiting for child");
        let status = WaitStatus::from(record.wait_finished());

        if let Err(e) = deliver(status) {
            debug!(pid = target, parent, "Status delivery failed: {}", e);
            return Err(e);
        }

        if !self.table.remove_record(&record) {
            error!(pid = target, parent, "Collected child was already reaped");
        }
        info!(pid = target, parent, ?status, "Collected child");
        Ok((target, status))
    }

    fn release_address_space(&self, process: &Process) {
        if let Some(space) = process.take_address_space() {
            self.memory.destroy(space);
        }
    }

    #[inline]
    pub fn table(&self) -> &Arc<ProcessTable> {
        &self.table
    }

    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.table.snapshot()
    }

    #[inline]
    pub fn process_count(&self) -> usize {
        self.table.len()
    }
}

impl Clone for ProcessManager {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            memory: Arc::clone(&self.memory),
            cloner: Arc::clone(&self.cloner),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl std::fmt::Debug for ProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessManager")
            .field("capacity", &self.table.capacity())
            .field("live", &self.table.len())
            .finish_non_exhaustive()
    }
}

fn invariant_violation(message: String) -> ProcessError {
    error!("Lifecycle invariant violated: {}", message);
    ProcessError::InvariantViolation(message)
}
