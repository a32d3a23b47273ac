/*!
 * Lifecycle Record
 *
 * Per-identifier bookkeeping: parent link, running/finished state and the
 * monitor a collecting parent parks on. The record holds only a weak
 * reference to its process so a destroyed process is never kept alive by
 * the table.
 */

use super::object::Process;
use super::types::{ExitReason, LifecycleState, ProcessInfo};
use crate::core::sync::Monitor;
use crate::core::types::Pid;
use std::sync::{Arc, Weak};

/// State guarded by the record monitor
#[derive(Debug)]
struct RecordState {
    parent: Option<Pid>,
    lifecycle: LifecycleState,
}

/// Outcome of a process retiring its own record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retirement {
    /// Finished; stays until the parent collects it
    AwaitingParent,
    /// No parent on record; the caller must remove it
    Unclaimed,
    /// Record was already finished
    AlreadyFinished,
}

/// What a departing parent must do with one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentRelease {
    /// Child already finished and will never be collected
    Reap,
    /// Child still running; it now has no parent and reaps itself
    Orphaned,
}

/// Lifecycle record for one identifier
#[derive(Debug)]
pub struct LifecycleRecord {
    pid: Pid,
    name: String,
    process: Weak<Process>,
    monitor: Monitor<RecordState>,
}

impl LifecycleRecord {
    pub(crate) fn new(pid: Pid, process: &Arc<Process>, parent: Option<Pid>) -> Self {
        Self {
            pid,
            name: process.name().to_string(),
            process: Arc::downgrade(process),
            monitor: Monitor::new(RecordState {
                parent,
                lifecycle: LifecycleState::Running,
            }),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The owning process, unless it has been destroyed
    pub fn process(&self) -> Option<Arc<Process>> {
        self.process.upgrade()
    }

    /// Whether this record was created for `process`
    #[inline]
    pub fn belongs_to(&self, process: &Arc<Process>) -> bool {
        std::ptr::eq(self.process.as_ptr(), Arc::as_ptr(process))
    }

    pub fn parent(&self) -> Option<Pid> {
        self.monitor.lock().parent
    }

    pub fn state(&self) -> LifecycleState {
        self.monitor.lock().lifecycle
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Block until the process finishes and return why it did
    ///
    /// Parks on the record monitor only; never call with the table lock held.
    pub fn wait_finished(&self) -> ExitReason {
        self.monitor.wait_for(|s| s.lifecycle.exit_reason())
    }

    /// Publish the exit reason and wake any waiter
    ///
    /// Parentless records are left running for the caller to remove.
    pub(crate) fn retire(&self, reason: ExitReason) -> Retirement {
        let mut state = self.monitor.lock();
        if state.lifecycle.is_finished() {
            return Retirement::AlreadyFinished;
        }
        if state.parent.is_none() {
            return Retirement::Unclaimed;
        }
        state.lifecycle = LifecycleState::Finished(reason);
        drop(state);
        self.monitor.notify_all();
        Retirement::AwaitingParent
    }

    /// Detach this record from `parent` if it is that parent's child
    pub(crate) fn release_from(&self, parent: Pid) -> Option<ParentRelease> {
        let mut state = self.monitor.lock();
        if state.parent != Some(parent) {
            return None;
        }
        if state.lifecycle.is_finished() {
            Some(ParentRelease::Reap)
        } else {
            state.parent = None;
            Some(ParentRelease::Orphaned)
        }
    }

    pub fn info(&self) -> ProcessInfo {
        let state = self.monitor.lock();
        ProcessInfo {
            pid: self.pid,
            name: self.name.clone(),
            parent: state.parent,
            state: state.lifecycle,
        }
    }
}
