//! Virtual addresses and TLB keys.
//!
//! This module defines the strong types the access layer and the directory agree on:
//! 1. **Virtual Addresses:** Byte addresses inside a process's address space.
//! 2. **Keys:** The `(pid, page)` identity of a translation and its packed 30-bit tag.

use std::fmt;

use super::constants::{MAX_PAGE_NUMBER, PAGE_NUMBER_BITS, PAGE_SHIFT, PAGE_SIZE, TAG_MASK};

/// A virtual address in a process's address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtAddr(pub u32);

impl VirtAddr {
    /// Creates a new virtual address from a raw value.
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the virtual page number containing this address.
    #[inline]
    pub const fn page_number(self) -> u32 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the byte offset within the page.
    #[inline]
    pub const fn page_offset(self) -> u32 {
        self.0 & (PAGE_SIZE - 1)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Identity of a cached translation: a process id and one of its virtual pages.
///
/// The page number is limited to [`PAGE_NUMBER_BITS`] bits so that the packed tag
/// `(pid << 14) | page` identifies the pair uniquely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TlbKey {
    pid: u16,
    page: u16,
}

impl TlbKey {
    /// Creates a key, or `None` if `page` does not fit the tag's page-number field.
    pub fn new(pid: u16, page: u32) -> Option<Self> {
        if page >= MAX_PAGE_NUMBER {
            return None;
        }
        Some(Self {
            pid,
            page: page as u16,
        })
    }

    /// Recovers a key from a 30-bit tag.
    pub const fn from_tag(tag: u32) -> Self {
        let tag = tag & TAG_MASK;
        Self {
            pid: (tag >> PAGE_NUMBER_BITS) as u16,
            page: (tag & (MAX_PAGE_NUMBER - 1)) as u16,
        }
    }

    /// Process id.
    #[inline]
    pub const fn pid(self) -> u16 {
        self.pid
    }

    /// Virtual page number.
    #[inline]
    pub const fn page(self) -> u32 {
        self.page as u32
    }

    /// Packed tag stored in a slot's control word.
    #[inline]
    pub const fn tag(self) -> u32 {
        ((self.pid as u32) << PAGE_NUMBER_BITS) | self.page as u32
    }
}

impl fmt::Display for TlbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid={} page={}", self.pid, self.page)
    }
}
