//! Two-way set-associative TLB simulator library.
//!
//! This crate emulates a hardware Translation Lookaside Buffer whose entries live on a
//! byte-addressable memory device:
//! 1. **Device:** A zero-filled byte store with big-endian word accessors and one lock.
//! 2. **Directory:** Packed valid/recency/tag control words plus PTE payloads, two ways per
//!    set, with lookup, insert-or-evict and invalidate.
//! 3. **Access Layer:** Allocate, free, read and write on behalf of processes, counting
//!    hits and misses and refilling on a miss.
//! 4. **Simulation:** Configuration, workload scripts, statistics and dumps.

/// Common types and constants (addresses, keys, PTEs, errors).
pub mod common;
/// Simulator configuration (defaults and JSON loading).
pub mod config;
/// CPU-facing access layer and translation units.
pub mod core;
/// Workload scripts and the multi-threaded simulator.
pub mod sim;
/// Storage devices backing the TLB.
pub mod soc;
/// Hit/miss statistics and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// CPU-facing access layer.
pub use crate::core::{Cpu, Process};
/// TLB directory.
pub use crate::core::units::mmu::Tlb;
/// Default TLB storage device.
pub use crate::soc::TlbMemory;
