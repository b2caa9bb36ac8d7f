//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Paging Constants:** Page size and the widths of the page-number and pid fields.
//! 2. **Entry Layout:** Way and set sizes of the TLB directory as stored on the device.
//! 3. **Control Word Bits:** Positions of the valid, recency and tag fields.
//! 4. **PTE Bits:** Present flag and frame-number mask of a page-table entry.

/// Page size in bytes.
pub const PAGE_SIZE: u32 = 256;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u32 = 8;

/// Width of the page-number field inside a tag.
pub const PAGE_NUMBER_BITS: u32 = 14;

/// Largest page number representable in a tag (exclusive bound).
pub const MAX_PAGE_NUMBER: u32 = 1 << PAGE_NUMBER_BITS;

/// Width of the tag field of a control word (pid bits + page-number bits).
pub const TAG_BITS: u32 = 30;

/// Mask selecting the tag from a control word.
pub const TAG_MASK: u32 = (1 << TAG_BITS) - 1;

/// Number of low page-number bits folded into the set index.
pub const SET_PAGE_BITS: u32 = 5;

/// Bytes per way: a 4-byte control word followed by a 4-byte PTE payload.
pub const ENTRY_SIZE: usize = 8;

/// Ways per set.
pub const WAYS: usize = 2;

/// Bytes per set.
pub const SET_SIZE: usize = ENTRY_SIZE * WAYS;

/// Offset of the PTE payload inside a way.
pub const PTE_OFFSET: usize = 4;

/// Control word valid bit.
pub const CTRL_VALID: u32 = 1 << 31;

/// Control word recently-used bit.
pub const CTRL_RECENT: u32 = 1 << 30;

/// Valid bit as seen in byte 0 of a way.
pub const CTRL_BYTE_VALID: u8 = 1 << 7;

/// Recently-used bit as seen in byte 0 of a way.
pub const CTRL_BYTE_RECENT: u8 = 1 << 6;

/// PTE present bit.
pub const PTE_PRESENT: u32 = 1 << 31;

/// PTE swapped bit. Carried through the cache untouched.
pub const PTE_SWAPPED: u32 = 1 << 30;

/// Mask selecting the physical frame number from a PTE.
pub const PTE_FPN_MASK: u32 = 0x1FFF;

/// Default TLB device capacity in bytes.
pub const DEFAULT_TLB_SIZE: usize = 512;

/// Default main RAM size in bytes (1 MiB).
pub const DEFAULT_RAM_SIZE: usize = 1024 * 1024;
