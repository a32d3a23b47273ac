/*!
 * Memory Manager
 *
 * Page-budget allocator for simulated address spaces. Every page of every
 * live address space is charged against one global budget, so duplication
 * during spawn can fail with OutOfMemory exactly like a real kernel's
 * address-space copy.
 */

use super::address_space::{AddressSpace, AddressSpaceId};
use super::types::{MemoryError, MemoryResult, MemoryStats};
use crate::process::traits::AddressSpaceManager;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Memory manager
///
/// Cheap to clone; clones share the same budget.
#[derive(Clone)]
pub struct MemoryManager {
    total_pages: usize,
    used_pages: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
    // Pages charged per live address space
    spaces: Arc<DashMap<AddressSpaceId, usize, RandomState>>,
}

impl MemoryManager {
    pub fn new(total_pages: usize) -> Self {
        info!(total_pages, "Memory manager initialized");
        Self {
            total_pages,
            used_pages: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
            spaces: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Reserve `pages` from the budget or fail without side effects
    fn charge(&self, pages: usize) -> MemoryResult<()> {
        self.used_pages
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(pages)
                    .filter(|&next| next <= self.total_pages)
            })
            .map(|_| ())
            .map_err(|used| MemoryError::OutOfMemory {
                requested: pages,
                available: self.total_pages.saturating_sub(used),
                total: self.total_pages,
            })
    }

    fn register(&self, pages: usize) -> AddressSpaceId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.spaces.insert(id, pages);
        id
    }

    /// Pages charged to one address space (0 if unknown)
    pub fn space_pages(&self, id: AddressSpaceId) -> usize {
        self.spaces.get(&id).map(|r| *r.value()).unwrap_or(0)
    }

    pub fn stats(&self) -> MemoryStats {
        let used = self.used_pages.load(Ordering::Acquire);
        MemoryStats {
            total_pages: self.total_pages,
            used_pages: used,
            available_pages: self.total_pages.saturating_sub(used),
            address_spaces: self.spaces.len(),
        }
    }
}

impl AddressSpaceManager for MemoryManager {
    fn create(&self, pages: usize) -> MemoryResult<AddressSpace> {
        self.charge(pages)?;
        let id = self.register(pages);
        debug!(id, pages, "Created address space");
        Ok(AddressSpace::zeroed(id, pages))
    }

    fn duplicate(&self, source: &AddressSpace) -> MemoryResult<AddressSpace> {
        let pages = source.pages();
        if let Err(e) = self.charge(pages) {
            warn!(source = source.id(), pages, "Address space copy failed: {}", e);
            return Err(e);
        }
        let id = self.register(pages);
        debug!(source = source.id(), id, pages, "Duplicated address space");
        Ok(source.copy_as(id))
    }

    fn destroy(&self, space: AddressSpace) {
        match self.spaces.remove(&space.id()) {
            Some((id, pages)) => {
                self.used_pages.fetch_sub(pages, Ordering::AcqRel);
                debug!(id, pages, "Destroyed address space");
            }
            None => warn!(id = space.id(), "Destroying an unknown address space"),
        }
    }
}
