//! Memory-manager interface.
//!
//! The TLB does not own page tables. Allocation, region bookkeeping and the data path
//! belong to a memory manager behind this trait; the access layer only asks it for
//! authoritative answers and copies PTEs into the directory.

use std::ops::RangeInclusive;

use crate::common::{PAGE_SIZE, Pte, VirtAddr, VmError};

/// Bounds of an allocated region: `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// First byte.
    pub start: VirtAddr,
    /// One past the last byte.
    pub end: VirtAddr,
}

impl Region {
    /// Creates a region of `size` bytes at `start`, clipped at the top of the address space.
    pub const fn new(start: u32, size: u32) -> Self {
        Self {
            start: VirtAddr(start),
            end: VirtAddr(start.saturating_add(size)),
        }
    }

    /// True for a zero-byte region.
    pub const fn is_empty(&self) -> bool {
        self.end.0 <= self.start.0
    }

    /// True if `addr` lies inside the region.
    pub const fn contains(&self, addr: VirtAddr) -> bool {
        addr.0 >= self.start.0 && addr.0 < self.end.0
    }

    /// Pages touched by the region, or `None` for an empty region.
    pub fn pages(&self) -> Option<RangeInclusive<u32>> {
        if self.is_empty() {
            return None;
        }
        Some(self.start.page_number()..=(self.end.0 - 1) / PAGE_SIZE)
    }
}

/// Authoritative page-table and data path consumed by the CPU-facing TLB layer.
///
/// Implementations are shared by every virtual CPU and must synchronize internally.
pub trait MemoryManager: Send + Sync {
    /// Allocates `size` bytes for `region` in memory area `vmaid`, returning the start.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]; the caller propagates it unchanged.
    fn alloc(&self, pid: u16, vmaid: u32, region: u32, size: u32) -> Result<VirtAddr, VmError>;

    /// Releases `region`.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]; the caller propagates it unchanged.
    fn free(&self, pid: u16, vmaid: u32, region: u32) -> Result<(), VmError>;

    /// Reads the byte at `offset` inside `region`.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]; the caller propagates it unchanged.
    fn read(&self, pid: u16, vmaid: u32, region: u32, offset: u32) -> Result<u8, VmError>;

    /// Writes `value` at `offset` inside `region`.
    ///
    /// # Errors
    ///
    /// Any [`VmError`]; the caller propagates it unchanged.
    fn write(&self, pid: u16, vmaid: u32, region: u32, offset: u32, value: u8)
    -> Result<(), VmError>;

    /// Symbol-table lookup of a region's bounds.
    fn region(&self, pid: u16, region: u32) -> Option<Region>;

    /// Current page-table entry for `page`; [`Pte::EMPTY`] when unmapped.
    fn page_table_entry(&self, pid: u16, page: u32) -> Pte;
}
