//! Common utilities and types used throughout the TLB simulator.
//!
//! This module provides the building blocks shared by the device, the directory and
//! the access layer. It includes:
//! 1. **Address Types:** Virtual addresses and `(pid, page)` keys.
//! 2. **Constants:** Page geometry, entry layout and bit positions.
//! 3. **Page-Table Entries:** The opaque PTE word and its present/frame accessors.
//! 4. **Error Handling:** Device, configuration, memory-manager and access errors.

/// Address and key definitions.
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types.
pub mod error;

/// Page-table entry payload.
pub mod pte;

pub use addr::{TlbKey, VirtAddr};
pub use constants::{ENTRY_SIZE, PAGE_SIZE, SET_SIZE, WAYS};
pub use error::{AccessError, ConfigError, DeviceError, VmError};
pub use pte::Pte;
