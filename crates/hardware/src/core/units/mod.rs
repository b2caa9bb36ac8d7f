//! Functional units.
//!
//! This module contains the memory management unit: the TLB directory, the
//! memory-manager interface and the reference paged implementation.

/// Memory Management Unit with the TLB directory and memory manager.
pub mod mmu;
