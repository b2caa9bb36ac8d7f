//! Page-table entry payload.
//!
//! The PTE format belongs to the memory manager. The TLB stores it as an opaque
//! 32-bit word and only looks at the present bit and the frame number.

use std::fmt;

use super::constants::{PTE_FPN_MASK, PTE_PRESENT, PTE_SWAPPED};

/// A raw 32-bit page-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Pte(pub u32);

impl Pte {
    /// An entry with no mapping.
    pub const EMPTY: Self = Self(0);

    /// Builds a present entry pointing at `frame`.
    pub const fn present(frame: u32) -> Self {
        Self(PTE_PRESENT | (frame & PTE_FPN_MASK))
    }

    /// Returns the raw word.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if the page is resident in a frame.
    #[inline]
    pub const fn is_present(self) -> bool {
        self.0 & PTE_PRESENT != 0
    }

    /// Returns true if the page was swapped out.
    #[inline]
    pub const fn is_swapped(self) -> bool {
        self.0 & PTE_SWAPPED != 0
    }

    /// Physical frame number encoded in the low bits.
    #[inline]
    pub const fn frame(self) -> u32 {
        self.0 & PTE_FPN_MASK
    }
}

impl From<u32> for Pte {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Pte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_present() {
            write!(f, "frame {}", self.frame())
        } else {
            write!(f, "not present ({:#010x})", self.0)
        }
    }
}
