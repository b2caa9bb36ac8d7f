//! Paged memory manager.
//!
//! A small reference [`MemoryManager`]: one flat page table and symbol table per process,
//! regions laid out back to back from virtual address 0, and frames handed out from a
//! shared pool of main RAM when a region first touches a page. A page's frame is returned
//! to the pool once no remaining region of the process covers it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::vm::{MemoryManager, Region};
use crate::common::constants::{MAX_PAGE_NUMBER, PTE_FPN_MASK};
use crate::common::{ConfigError, PAGE_SIZE, Pte, VirtAddr, VmError};
use crate::soc::memory::buffer::StorageBuffer;

#[derive(Debug)]
struct AddressSpace {
    page_table: Vec<Pte>,
    regions: HashMap<u32, Region>,
    brk: u32,
}

impl AddressSpace {
    fn new(max_pages: u32) -> Self {
        Self {
            page_table: vec![Pte::EMPTY; max_pages as usize],
            regions: HashMap::new(),
            brk: 0,
        }
    }

    fn page_in_use(&self, page: u32) -> bool {
        self.regions
            .values()
            .filter_map(Region::pages)
            .any(|pages| pages.contains(&page))
    }
}

#[derive(Debug)]
struct VmState {
    free_frames: Vec<u32>,
    spaces: HashMap<u16, AddressSpace>,
}

/// Reference memory manager backed by a main RAM buffer.
#[derive(Debug)]
pub struct PagedMemory {
    ram: StorageBuffer,
    max_pages: u32,
    state: Mutex<VmState>,
}

impl PagedMemory {
    /// Creates a manager over `ram_size` bytes of main memory with `max_pages` virtual
    /// pages per process.
    ///
    /// Frames beyond what a PTE can address are left unused.
    ///
    /// # Errors
    ///
    /// [`ConfigError::RamTooSmall`] if the RAM cannot hold one page.
    pub fn new(ram_size: usize, max_pages: u32) -> Result<Self, ConfigError> {
        let frames = (ram_size / PAGE_SIZE as usize).min(PTE_FPN_MASK as usize + 1) as u32;
        if frames == 0 {
            return Err(ConfigError::RamTooSmall(ram_size));
        }
        // Popped from the back, so low frames go out first.
        let free_frames = (0..frames).rev().collect();
        Ok(Self {
            ram: StorageBuffer::new(ram_size),
            max_pages: max_pages.min(MAX_PAGE_NUMBER),
            state: Mutex::new(VmState {
                free_frames,
                spaces: HashMap::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, VmState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of frames not mapped by any process.
    pub fn free_frames(&self) -> usize {
        self.state().free_frames.len()
    }

    /// Tears down a process, returning all of its frames to the pool.
    pub fn remove_process(&self, pid: u16) {
        let mut state = self.state();
        let Some(space) = state.spaces.remove(&pid) else {
            return;
        };
        let frames: Vec<u32> = space
            .page_table
            .iter()
            .filter(|pte| pte.is_present())
            .map(|pte| pte.frame())
            .collect();
        info!(pid, frames = frames.len(), "address space released");
        state.free_frames.extend(frames);
    }

    fn translate(&self, pid: u16, vmaid: u32, region: u32, offset: u32) -> Result<usize, VmError> {
        if vmaid != 0 {
            return Err(VmError::UnknownArea(vmaid));
        }
        let state = self.state();
        let space = state.spaces.get(&pid).ok_or(VmError::UnknownProcess(pid))?;
        let bounds = space
            .regions
            .get(&region)
            .ok_or(VmError::UnknownRegion(region))?;
        let addr = VirtAddr(bounds.start.0.saturating_add(offset));
        if !bounds.contains(addr) {
            return Err(VmError::OutOfBounds { region, offset });
        }
        let pte = space.page_table[addr.page_number() as usize];
        if !pte.is_present() {
            return Err(VmError::PageNotPresent(addr.page_number()));
        }
        Ok((pte.frame() * PAGE_SIZE + addr.page_offset()) as usize)
    }
}

impl MemoryManager for PagedMemory {
    fn alloc(&self, pid: u16, vmaid: u32, region: u32, size: u32) -> Result<VirtAddr, VmError> {
        if vmaid != 0 {
            return Err(VmError::UnknownArea(vmaid));
        }
        let max_pages = self.max_pages;
        let mut guard = self.state();
        let VmState {
            free_frames,
            spaces,
        } = &mut *guard;
        let space = spaces
            .entry(pid)
            .or_insert_with(|| AddressSpace::new(max_pages));

        if space.regions.contains_key(&region) {
            return Err(VmError::RegionInUse(region));
        }
        let oom = VmError::OutOfMemory { region, size };
        let end = space.brk.checked_add(size).ok_or_else(|| oom.clone())?;
        let bounds = Region {
            start: VirtAddr(space.brk),
            end: VirtAddr(end),
        };

        let mut mapped = Vec::new();
        if let Some(pages) = bounds.pages() {
            if *pages.end() >= max_pages {
                return Err(oom);
            }
            for page in pages {
                if space.page_table[page as usize].is_present() {
                    continue;
                }
                let Some(frame) = free_frames.pop() else {
                    // Undo this call's mappings before failing.
                    for page in mapped {
                        let pte = std::mem::take(&mut space.page_table[page as usize]);
                        free_frames.push(pte.frame());
                    }
                    return Err(oom);
                };
                space.page_table[page as usize] = Pte::present(frame);
                mapped.push(page);
            }
        }

        space.brk = end;
        let _ = space.regions.insert(region, bounds);
        debug!(pid, region, start = %bounds.start, size, new_frames = mapped.len(), "region allocated");
        Ok(bounds.start)
    }

    fn free(&self, pid: u16, vmaid: u32, region: u32) -> Result<(), VmError> {
        if vmaid != 0 {
            return Err(VmError::UnknownArea(vmaid));
        }
        let mut guard = self.state();
        let VmState {
            free_frames,
            spaces,
        } = &mut *guard;
        let space = spaces.get_mut(&pid).ok_or(VmError::UnknownProcess(pid))?;
        let bounds = space
            .regions
            .remove(&region)
            .ok_or(VmError::UnknownRegion(region))?;

        let mut released = 0usize;
        for page in bounds.pages().into_iter().flatten() {
            if space.page_in_use(page) {
                continue;
            }
            let pte = std::mem::take(&mut space.page_table[page as usize]);
            if pte.is_present() {
                free_frames.push(pte.frame());
                released += 1;
            }
        }
        debug!(pid, region, released, "region freed");
        Ok(())
    }

    fn read(&self, pid: u16, vmaid: u32, region: u32, offset: u32) -> Result<u8, VmError> {
        let phys = self.translate(pid, vmaid, region, offset)?;
        Ok(self.ram.read_u8(phys)?)
    }

    fn write(
        &self,
        pid: u16,
        vmaid: u32,
        region: u32,
        offset: u32,
        value: u8,
    ) -> Result<(), VmError> {
        let phys = self.translate(pid, vmaid, region, offset)?;
        Ok(self.ram.write_u8(phys, value)?)
    }

    fn region(&self, pid: u16, region: u32) -> Option<Region> {
        self.state()
            .spaces
            .get(&pid)
            .and_then(|space| space.regions.get(&region).copied())
    }

    fn page_table_entry(&self, pid: u16, page: u32) -> Pte {
        self.state()
            .spaces
            .get(&pid)
            .and_then(|space| space.page_table.get(page as usize).copied())
            .unwrap_or(Pte::EMPTY)
    }
}
