/*!
 * Synchronization Primitives
 *
 * Lock-plus-condition monitors used for the exit/wait rendezvous.
 */

mod monitor;

pub use monitor::Monitor;
