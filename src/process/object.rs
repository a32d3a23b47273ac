/*!
 * Process Object
 *
 * The per-process state that is not lifecycle bookkeeping: name, assigned
 * identifier and the user address space. Lifecycle state lives in the
 * process table record, which refers back here without owning the process.
 */

use crate::core::types::Pid;
use crate::memory::AddressSpace;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// A process as seen by the lifecycle core
pub struct Process {
    name: String,
    pid: OnceLock<Pid>,
    address_space: Mutex<Option<AddressSpace>>,
    exited: AtomicBool,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            pid: OnceLock::new(),
            address_space: Mutex::new(None),
            exited: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier stamped by the process table, if registered
    #[inline]
    pub fn pid(&self) -> Option<Pid> {
        self.pid.get().copied()
    }

    /// Stamp the identifier; a process is registered at most once
    pub(crate) fn assign_pid(&self, pid: Pid) -> bool {
        self.pid.set(pid).is_ok()
    }

    /// Install an address space, returning the one it replaces
    pub fn install_address_space(&self, space: AddressSpace) -> Option<AddressSpace> {
        self.address_space.lock().replace(space)
    }

    pub fn take_address_space(&self) -> Option<AddressSpace> {
        self.address_space.lock().take()
    }

    #[inline]
    pub fn has_address_space(&self) -> bool {
        self.address_space.lock().is_some()
    }

    pub fn with_address_space<R>(&self, f: impl FnOnce(&AddressSpace) -> R) -> Option<R> {
        self.address_space.lock().as_ref().map(f)
    }

    pub fn with_address_space_mut<R>(&self, f: impl FnOnce(&mut AddressSpace) -> R) -> Option<R> {
        self.address_space.lock().as_mut().map(f)
    }

    #[inline]
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    pub(crate) fn mark_exited(&self) -> bool {
        !self.exited.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("pid", &self.pid())
            .field("exited", &self.has_exited())
            .finish()
    }
}
