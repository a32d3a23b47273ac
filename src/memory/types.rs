/*!
 * Memory Types
 * Common types for the simulated user memory
 */

use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Out of memory: requested {requested} pages, {available} available ({total} total)")]
    OutOfMemory {
        requested: usize,
        available: usize,
        total: usize,
    },

    #[error("Bad user address: 0x{address:x} (+{len} bytes)")]
    Fault { address: Address, len: Size },
}

/// Memory statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryStats {
    pub total_pages: usize,
    pub used_pages: usize,
    pub available_pages: usize,
    pub address_spaces: usize,
}

impl MemoryStats {
    /// Percentage of the page budget in use
    #[inline]
    #[must_use]
    pub fn usage_percent(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            (self.used_pages as f64 / self.total_pages as f64) * 100.0
        }
    }
}
