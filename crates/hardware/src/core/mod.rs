//! Core TLB implementation.
//!
//! This module contains the CPU-facing access layer and the translation units
//! behind it: the TLB directory and the memory-manager interface it caches for.

/// CPU-facing access layer and process control blocks.
pub mod cpu;

/// Translation units (TLB directory, memory manager).
pub mod units;

pub use self::cpu::Cpu;
pub use self::cpu::process::Process;
