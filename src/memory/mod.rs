/*!
 * Memory Module
 * Simulated user address spaces and the page budget they are charged to
 */

pub mod address_space;
pub mod manager;
pub mod types;

// Re-export for convenience
pub use address_space::{AddressSpace, AddressSpaceId};
pub use manager::MemoryManager;
pub use types::*;
