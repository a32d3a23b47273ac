/*!
 * Address Space
 *
 * Flat simulated user memory: `pages` whole pages mapped contiguously from
 * USER_BASE. Anything outside that range faults, which is all the copy
 * routines need to report a bad status pointer.
 */

use super::types::{MemoryError, MemoryResult};
use crate::core::limits::{PAGE_SIZE, USER_BASE};
use crate::core::types::{Address, Size};

/// Identifier of an address space within its memory manager
pub type AddressSpaceId = u64;

/// A process's user memory
#[derive(Debug)]
pub struct AddressSpace {
    id: AddressSpaceId,
    bytes: Vec<u8>,
}

impl AddressSpace {
    pub(super) fn zeroed(id: AddressSpaceId, pages: usize) -> Self {
        Self {
            id,
            bytes: vec![0; pages * PAGE_SIZE],
        }
    }

    /// Byte-for-byte copy under a new id
    pub(super) fn copy_as(&self, id: AddressSpaceId) -> Self {
        Self {
            id,
            bytes: self.bytes.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> AddressSpaceId {
        self.id
    }

    #[inline]
    pub fn pages(&self) -> usize {
        self.bytes.len() / PAGE_SIZE
    }

    #[inline]
    pub const fn base(&self) -> Address {
        USER_BASE
    }

    /// One past the last mapped address
    #[inline]
    pub fn end(&self) -> Address {
        USER_BASE + self.bytes.len()
    }

    /// Whether `[address, address + len)` is mapped
    pub fn contains(&self, address: Address, len: Size) -> bool {
        address >= USER_BASE
            && address
                .checked_add(len)
                .map_or(false, |end| end <= self.end())
    }

    fn range(&self, address: Address, len: Size) -> MemoryResult<std::ops::Range<usize>> {
        if !self.contains(address, len) {
            return Err(MemoryError::Fault { address, len });
        }
        let start = address - USER_BASE;
        Ok(start..start + len)
    }

    /// Copy kernel bytes out to user memory
    pub fn copy_out(&mut self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Copy user bytes into the kernel
    pub fn copy_in(&self, address: Address, len: Size) -> MemoryResult<Vec<u8>> {
        let range = self.range(address, len)?;
        Ok(self.bytes[range].to_vec())
    }

    pub fn write_i32(&mut self, address: Address, value: i32) -> MemoryResult<()> {
        self.copy_out(address, &value.to_ne_bytes())
    }

    pub fn read_i32(&self, address: Address) -> MemoryResult<i32> {
        let bytes = self.copy_in(address, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes);
        Ok(i32::from_ne_bytes(word))
    }
}
