/*!
 * Monitoring Module
 * Structured tracing for system calls
 */

pub mod tracer;

pub use tracer::{generate_trace_id, init_tracing, SyscallSpan};
