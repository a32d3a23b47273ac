/*!
 * Process Table
 *
 * Fixed-capacity registry from identifier to lifecycle record. A single
 * coarse lock guards every structural edit; it is held only for short
 * scans and never across a rendezvous wait.
 */

use super::object::Process;
use super::record::LifecycleRecord;
use super::types::{ProcessInfo, ProcessResult};
use crate::core::errors::ProcessError;
use crate::core::limits::PID_MIN;
use crate::core::types::Pid;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct Slots {
    // Slot i holds the record for pid i + PID_MIN
    entries: Vec<Option<Arc<LifecycleRecord>>>,
    live: usize,
}

impl Slots {
    #[inline]
    fn index(pid: Pid) -> Option<usize> {
        pid.checked_sub(PID_MIN).map(|i| i as usize)
    }

    #[inline]
    fn pid_at(index: usize) -> Pid {
        index as Pid + PID_MIN
    }

    fn get(&self, pid: Pid) -> Option<&Arc<LifecycleRecord>> {
        Self::index(pid)
            .and_then(|i| self.entries.get(i))
            .and_then(Option::as_ref)
    }

    fn remove(&mut self, pid: Pid) -> Option<Arc<LifecycleRecord>> {
        let slot = Self::index(pid).and_then(|i| self.entries.get_mut(i))?;
        let record = slot.take()?;
        self.live -= 1;
        Some(record)
    }

    fn remove_record(&mut self, record: &Arc<LifecycleRecord>) -> bool {
        let Some(slot) = Self::index(record.pid()).and_then(|i| self.entries.get_mut(i)) else {
            return false;
        };
        match slot {
            Some(current) if Arc::ptr_eq(current, record) => {
                *slot = None;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Process identity registry
#[derive(Debug)]
pub struct ProcessTable {
    slots: Mutex<Slots>,
    capacity: usize,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: vec![None; capacity],
                live: 0,
            }),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently present
    pub fn len(&self) -> usize {
        self.slots.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.slots.lock().get(pid).is_some()
    }

    /// Register `process` under the lowest free identifier
    ///
    /// The new record starts running with `parent` on record, and the
    /// identifier is stamped onto the process before the lock is released.
    pub fn allocate(&self, process: &Arc<Process>, parent: Option<Pid>) -> ProcessResult<Pid> {
        let mut slots = self.slots.lock();
        if slots.live >= self.capacity {
            warn!(capacity = self.capacity, "Process table full");
            return Err(ProcessError::ResourceExhausted {
                capacity: self.capacity,
            });
        }

        let index = slots
            .entries
            .iter()
            .position(Option::is_none)
            .ok_or(ProcessError::ResourceExhausted {
                capacity: self.capacity,
            })?;
        let pid = Slots::pid_at(index);

        if !process.assign_pid(pid) {
            return Err(ProcessError::InvariantViolation(format!(
                "process '{}' is already registered as PID {:?}",
                process.name(),
                process.pid()
            )));
        }

        slots.entries[index] = Some(Arc::new(LifecycleRecord::new(pid, process, parent)));
        slots.live += 1;
        debug!(pid, ?parent, name = process.name(), "Allocated process record");
        Ok(pid)
    }

    /// Record for `pid`; identifiers outside the table are simply absent
    pub fn lookup(&self, pid: Pid) -> ProcessResult<Arc<LifecycleRecord>> {
        self.slots
            .lock()
            .get(pid)
            .cloned()
            .ok_or(ProcessError::NoSuchProcess(pid))
    }

    /// Remove whatever record is stored under `pid`
    ///
    /// Idempotent: a second call returns `None`.
    pub fn remove(&self, pid: Pid) -> Option<Arc<LifecycleRecord>> {
        let removed = self.slots.lock().remove(pid);
        if removed.is_some() {
            debug!(pid, "Removed process record");
        }
        removed
    }

    /// Remove `record` only if its slot still holds that exact record
    pub fn remove_record(&self, record: &Arc<LifecycleRecord>) -> bool {
        let removed = self.slots.lock().remove_record(record);
        if removed {
            debug!(pid = record.pid(), "Removed process record");
        }
        removed
    }

    /// Point-in-time view of every record, ordered by identifier
    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        let records: Vec<_> = self.slots.lock().entries.iter().flatten().cloned().collect();
        // Record locks are taken after the table lock is gone
        records.iter().map(|record| record.info()).collect()
    }

    /// Hold the coarse lock for a multi-step structural edit
    pub(crate) fn lock(&self) -> TableGuard<'_> {
        TableGuard {
            slots: self.slots.lock(),
        }
    }
}

/// Exclusive access to the table for the duration of a structural edit
///
/// Record locks may be taken while this is held, never the other way round.
pub(crate) struct TableGuard<'a> {
    slots: MutexGuard<'a, Slots>,
}

impl TableGuard<'_> {
    pub(crate) fn get(&self, pid: Pid) -> Option<Arc<LifecycleRecord>> {
        self.slots.get(pid).cloned()
    }

    pub(crate) fn remove(&mut self, pid: Pid) -> Option<Arc<LifecycleRecord>> {
        self.slots.remove(pid)
    }

    pub(crate) fn remove_record(&mut self, record: &Arc<LifecycleRecord>) -> bool {
        self.slots.remove_record(record)
    }

    /// Records whose parent on record is `parent`
    pub(crate) fn children_of(&self, parent: Pid) -> Vec<Arc<LifecycleRecord>> {
        self.slots
            .entries
            .iter()
            .flatten()
            .filter(|record| record.parent() == Some(parent))
            .cloned()
            .collect()
    }
}
