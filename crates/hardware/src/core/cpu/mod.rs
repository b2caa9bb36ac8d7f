//! CPU-facing TLB access layer.
//!
//! This module defines the `Cpu`, the surface a virtual CPU issues memory operations
//! through. It coordinates the following:
//! 1. **Allocation:** Region allocation through the memory manager, then pre-filling
//!    the TLB with every page the region spans.
//! 2. **Release:** Region free through the memory manager, then dropping the region's
//!    pages from the TLB.
//! 3. **Data Access:** Byte reads and writes through the memory manager, with a TLB probe
//!    on the side that counts hits and misses and refills on a miss.
//!
//! The memory manager is authoritative for data. The TLB only records translations and
//! never short-circuits a read or write. TLB failures are logged and treated as misses;
//! only memory-manager failures reach the caller.

/// Process control block with hit/miss counters.
pub mod process;

use tracing::{info, trace, warn};

use self::process::Process;
use crate::common::{AccessError, DeviceError, PAGE_SIZE, TlbKey, VirtAddr, VmError};
use crate::core::units::mmu::{InsertOutcome, MemoryManager, SyncReport, Tlb};
use crate::soc::{StorageDevice, TlbMemory};

/// Memory area every operation targets.
const DEFAULT_VMAID: u32 = 0;

/// Virtual CPU front end: a shared TLB plus the memory manager behind it.
///
/// `Cpu` is `Sync` whenever its parts are, so one instance can serve many threads.
#[derive(Debug)]
pub struct Cpu<M: MemoryManager, D: StorageDevice = TlbMemory> {
    tlb: Tlb<D>,
    mm: M,
}

impl<M: MemoryManager, D: StorageDevice> Cpu<M, D> {
    /// Creates a CPU over an existing TLB and memory manager.
    pub const fn new(tlb: Tlb<D>, mm: M) -> Self {
        Self { tlb, mm }
    }

    /// The TLB directory.
    pub const fn tlb(&self) -> &Tlb<D> {
        &self.tlb
    }

    /// The memory manager.
    pub const fn memory_manager(&self) -> &M {
        &self.mm
    }

    fn key(pid: u16, page: u32) -> Option<TlbKey> {
        let key = TlbKey::new(pid, page);
        if key.is_none() {
            warn!(pid, page, "page number does not fit a tlb tag");
        }
        key
    }

    /// Installs the current PTE for `key`. Failures are logged and dropped.
    fn refill(&self, key: TlbKey) {
        let pte = self.mm.page_table_entry(key.pid(), key.page());
        match self.tlb.insert(key, pte) {
            Ok(InsertOutcome::NoCandidate) => {
                warn!(%key, "tlb refill skipped: no replaceable way");
            }
            Ok(outcome) => trace!(%key, ?outcome, "tlb refill"),
            Err(err) => warn!(%key, %err, "tlb refill failed"),
        }
    }

    /// Looks `key` up for accounting purposes; device failures count as a miss.
    fn probe(&self, key: Option<TlbKey>) -> bool {
        let Some(key) = key else {
            return false;
        };
        match self.tlb.lookup(key) {
            Ok(frame) => frame.is_some(),
            Err(err) => {
                warn!(%key, %err, "tlb lookup failed");
                false
            }
        }
    }

    fn account(&self, process: &Process, key: Option<TlbKey>, hit: bool) {
        if hit {
            process.record_hit();
            return;
        }
        process.record_miss();
        if let Some(key) = key {
            self.refill(key);
        }
    }

    fn target(&self, pid: u16, region: u32, offset: u32) -> Result<VirtAddr, VmError> {
        let bounds = self
            .mm
            .region(pid, region)
            .ok_or(VmError::UnknownRegion(region))?;
        Ok(VirtAddr(bounds.start.val().saturating_add(offset)))
    }

    /// Allocates `size` bytes for `region` and pre-fills the TLB with every page it spans.
    ///
    /// A page already cached, such as the page a region shares with its predecessor, is
    /// not inserted twice.
    ///
    /// # Errors
    ///
    /// [`AccessError::Upstream`] when the memory manager rejects the allocation; the TLB
    /// is left untouched in that case.
    pub fn alloc(&self, process: &Process, size: u32, region: u32) -> Result<VirtAddr, AccessError> {
        let pid = process.pid();
        let start = self.mm.alloc(pid, DEFAULT_VMAID, region, size)?;

        let end = u64::from(start.val()) + u64::from(size);
        let mut page = start.page_number();
        while u64::from(page) * u64::from(PAGE_SIZE) < end {
            if let Some(key) = Self::key(pid, page) {
                if !matches!(self.tlb.contains(key), Ok(true)) {
                    self.refill(key);
                }
            }
            page += 1;
        }

        info!(pid, region, start = %start, size, "tlb alloc");
        Ok(start)
    }

    /// Frees `region` and clears the valid bit of every cached page it spanned.
    ///
    /// # Errors
    ///
    /// [`AccessError::Upstream`] when the region is unknown or the memory manager
    /// rejects the free; the TLB is left untouched in that case.
    pub fn free(&self, process: &Process, region: u32) -> Result<(), AccessError> {
        let pid = process.pid();
        let bounds = self
            .mm
            .region(pid, region)
            .ok_or(VmError::UnknownRegion(region))?;
        self.mm.free(pid, DEFAULT_VMAID, region)?;

        for page in bounds.pages().into_iter().flatten() {
            let Some(key) = Self::key(pid, page) else {
                continue;
            };
            if let Err(err) = self.tlb.clear_valid(key) {
                warn!(%key, %err, "tlb clear failed");
            }
        }

        info!(pid, region, "tlb free");
        Ok(())
    }

    /// Reads the byte at `offset` inside `region`.
    ///
    /// The value always comes from the memory manager. Afterwards the page is looked up
    /// in the TLB: a hit is counted, a miss is counted and the page refilled.
    ///
    /// # Errors
    ///
    /// [`AccessError::Upstream`] when the memory manager rejects the read; nothing is
    /// counted in that case.
    pub fn read(&self, process: &Process, region: u32, offset: u32) -> Result<u8, AccessError> {
        let pid = process.pid();
        let addr = self.target(pid, region, offset)?;
        let key = Self::key(pid, addr.page_number());

        let value = self.mm.read(pid, DEFAULT_VMAID, region, offset)?;
        let hit = self.probe(key);
        self.account(process, key, hit);

        trace!(pid, region, offset, %addr, value, hit, "tlb read");
        Ok(value)
    }

    /// Writes `value` at `offset` inside `region`.
    ///
    /// The TLB is probed first, then the write always goes to the memory manager. Once
    /// the write succeeds the probe is counted and a miss refilled.
    ///
    /// # Errors
    ///
    /// [`AccessError::Upstream`] when the memory manager rejects the write; nothing is
    /// counted in that case.
    pub fn write(
        &self,
        process: &Process,
        value: u8,
        region: u32,
        offset: u32,
    ) -> Result<(), AccessError> {
        let pid = process.pid();
        let addr = self.target(pid, region, offset)?;
        let key = Self::key(pid, addr.page_number());

        let hit = self.probe(key);
        self.mm.write(pid, DEFAULT_VMAID, region, offset, value)?;
        self.account(process, key, hit);

        trace!(pid, region, offset, %addr, value, hit, "tlb write");
        Ok(())
    }

    /// Drops every TLB entry of `process`, e.g. when it exits.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn flush_process(&self, process: &Process) -> Result<usize, DeviceError> {
        let cleared = self.tlb.flush_process(process.pid())?;
        info!(pid = process.pid(), cleared, "tlb flush");
        Ok(cleared)
    }

    /// Brings every cached entry of `process` back in line with its page table.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn sync_process(&self, process: &Process) -> Result<SyncReport, DeviceError> {
        let pid = process.pid();
        self.tlb
            .sync_process(pid, |page| self.mm.page_table_entry(pid, page))
    }
}
