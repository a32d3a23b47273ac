/*!
 * Trap Frame
 *
 * Saved user register state at the point a process entered the kernel.
 * Only the registers the call convention touches are modelled; the rest of
 * the general-purpose file travels as an opaque array.
 */

use crate::core::limits::INSTRUCTION_SIZE;
use crate::process::traits::ContextCloner;
use serde::{Deserialize, Serialize};

/// Number of general-purpose registers carried without interpretation
pub const SAVED_REGISTERS: usize = 24;

/// Register snapshot of a process inside a system call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrapFrame {
    /// Call number on entry, result or errno on exit
    pub v0: i64,
    pub v1: i64,
    pub a0: i64,
    pub a1: i64,
    pub a2: i64,
    /// Error flag on exit: 0 success, 1 failure
    pub a3: i64,
    pub sp: u64,
    pub ra: u64,
    /// Program counter of the call instruction
    pub epc: u64,
    pub saved: [u64; SAVED_REGISTERS],
}

impl TrapFrame {
    /// Frame for a process about to start at `entry`
    pub const fn new(entry: u64, stack_pointer: u64) -> Self {
        Self {
            v0: 0,
            v1: 0,
            a0: 0,
            a1: 0,
            a2: 0,
            a3: 0,
            sp: stack_pointer,
            ra: 0,
            epc: entry,
            saved: [0; SAVED_REGISTERS],
        }
    }

    /// Load a call number and its arguments
    pub fn set_call(&mut self, callno: i64, args: [i64; 3]) {
        self.v0 = callno;
        self.a0 = args[0];
        self.a1 = args[1];
        self.a2 = args[2];
    }

    /// Record a successful return value
    #[inline]
    pub fn set_return(&mut self, value: i64) {
        self.v0 = value;
        self.a3 = 0;
    }

    /// Record a failed call
    #[inline]
    pub fn set_error(&mut self, errno: i64) {
        self.v0 = errno;
        self.a3 = 1;
    }

    /// Step past the call instruction so it is not restarted
    #[inline]
    pub fn advance(&mut self) {
        self.epc += INSTRUCTION_SIZE;
    }

    #[inline]
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.a3 != 0
    }
}

impl Default for TrapFrame {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Context cloner following the MIPS call convention
///
/// The child gets the parent's registers with `v0 = 0` and `a3 = 0`, and its
/// program counter is already past the call instruction because the child
/// resumes without going back through the dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct MipsContextCloner;

impl ContextCloner for MipsContextCloner {
    fn clone_for_child(&self, parent: &TrapFrame) -> TrapFrame {
        let mut child = *parent;
        child.set_return(0);
        child.advance();
        child
    }
}
