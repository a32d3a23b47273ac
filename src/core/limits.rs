/*!
 * System Limits and Constants
 *
 * Centralized location for the process-table and simulated-memory limits.
 */

use std::time::Duration;

// =============================================================================
// PROCESS TABLE LIMITS
// =============================================================================

/// Lowest identifier handed out by the process table
/// The root process always receives this identifier
pub const PID_MIN: u32 = 1;

/// Default process table capacity
/// Identifiers are drawn from [PID_MIN, DEFAULT_MAX_PROCESSES]
pub const DEFAULT_MAX_PROCESSES: usize = 256;

/// Upper bound accepted by configuration
/// The table is scanned linearly, keep it small
pub const MAX_PROCESSES_CEILING: usize = 32_767;

// =============================================================================
// SIMULATED MEMORY
// =============================================================================

/// Page size of the simulated user memory (4KB)
pub const PAGE_SIZE: usize = 4 * 1024;

/// First valid user address
/// Everything below is unmapped so null-ish pointers fault
pub const USER_BASE: usize = 0x0040_0000;

/// Total pages available to all address spaces (16MB)
pub const DEFAULT_MEMORY_PAGES: usize = 4 * 1024;

/// Pages given to the root process address space (64KB)
pub const DEFAULT_PROCESS_PAGES: usize = 16;

// =============================================================================
// DISPATCH
// =============================================================================

/// Width of one instruction; the program counter advances by this after a call
pub const INSTRUCTION_SIZE: u64 = 4;

/// Dispatches slower than this are logged at warn level
pub const SLOW_SYSCALL_THRESHOLD: Duration = Duration::from_millis(10);
