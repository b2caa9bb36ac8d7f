//! Error definitions.
//!
//! This module defines the failure taxonomy shared by every layer. It provides:
//! 1. **Device Errors:** Byte accesses against the TLB storage device that could not complete.
//! 2. **Configuration Errors:** Device geometries or settings the directory cannot use.
//! 3. **Memory-Manager Errors:** Failures reported by the authoritative page-table path.
//! 4. **Access Errors:** What the CPU-facing layer hands back to its caller.
//!
//! A cache miss is deliberately absent: lookups report it as `Ok(None)`.

use thiserror::Error;

/// Failure of a storage device access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The address lies at or beyond the device capacity.
    #[error("device address {addr:#x} out of range (capacity {capacity:#x})")]
    OutOfRange {
        /// Faulting byte address.
        addr: usize,
        /// Device capacity in bytes.
        capacity: usize,
    },

    /// A thread panicked while holding the device lock.
    #[error("device lock poisoned")]
    Poisoned,
}

/// Invalid simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TLB device cannot hold a single set.
    #[error("tlb capacity of {0} bytes is smaller than one {set_size}-byte set", set_size = crate::common::constants::SET_SIZE)]
    TlbTooSmall(usize),

    /// Main memory cannot hold a single page.
    #[error("ram size of {0} bytes is smaller than one page")]
    RamTooSmall(usize),

    /// The JSON document did not match the configuration schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the memory manager that owns the page tables.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VmError {
    /// No free frames (or virtual pages) remain for the request.
    #[error("out of memory allocating {size} bytes for region {region}")]
    OutOfMemory {
        /// Requested region id.
        region: u32,
        /// Requested size in bytes.
        size: u32,
    },

    /// The region id is already bound to an allocation.
    #[error("region {0} is already allocated")]
    RegionInUse(u32),

    /// The region id is not in the process's symbol table.
    #[error("region {0} is not allocated")]
    UnknownRegion(u32),

    /// The offset lies outside the region.
    #[error("offset {offset} is outside region {region}")]
    OutOfBounds {
        /// Region id.
        region: u32,
        /// Offending offset.
        offset: u32,
    },

    /// The process has no address space registered.
    #[error("unknown process {0}")]
    UnknownProcess(u16),

    /// The memory area id is not supported.
    #[error("unsupported memory area {0}")]
    UnknownArea(u32),

    /// The page is mapped but has no resident frame.
    #[error("page {0} is not resident")]
    PageNotPresent(u32),

    /// Main memory rejected the physical access.
    #[error("main memory: {0}")]
    Memory(#[from] DeviceError),
}

/// Failure of a CPU-facing TLB operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The memory manager rejected the operation.
    #[error(transparent)]
    Upstream(#[from] VmError),
}
