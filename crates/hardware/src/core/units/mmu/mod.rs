//! Memory Management Unit (MMU).
//!
//! This module groups the translation machinery: the TLB directory that caches
//! page-table entries, the interface to the memory manager that owns the
//! authoritative page tables, and a reference paged implementation of it.

/// Reference paged memory manager.
pub mod paging;

/// Two-way set-associative TLB directory.
pub mod tlb;

/// Memory-manager interface and region bounds.
pub mod vm;

pub use self::paging::PagedMemory;
pub use self::tlb::{InsertOutcome, SyncReport, Tlb};
pub use self::vm::{MemoryManager, Region};
