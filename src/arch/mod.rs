/*!
 * Architecture Module
 * Saved execution context and its cloning for new processes
 */

pub mod trapframe;

pub use trapframe::{MipsContextCloner, TrapFrame, SAVED_REGISTERS};
