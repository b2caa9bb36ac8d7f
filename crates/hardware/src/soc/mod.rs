//! System-on-Chip (SoC) Components.
//!
//! This module organizes the physical storage devices of the simulated system:
//! the TLB's own memory device and the trait every byte-addressable device implements.

/// TLB memory device and its lock-guarded buffer.
pub mod memory;

/// Storage device trait.
pub mod traits;

pub use memory::TlbMemory;
pub use traits::StorageDevice;
