//! TLB entry codec.
//!
//! Each way occupies [`ENTRY_SIZE`](crate::common::ENTRY_SIZE) bytes on the device:
//!
//! ```text
//!  byte 0                          byte 3   byte 4 .. byte 7
//! +---+---+------------------------------+  +----------------+
//! | V | R |          tag (30 bits)       |  |  PTE (32 bits) |
//! +---+---+------------------------------+  +----------------+
//!  31  30  29                          0
//! ```
//!
//! Both words are big-endian, so the valid and recently-used flags live in the top two
//! bits of the way's first byte. Single-flag updates rewrite only that byte.

use std::fmt;

use crate::common::constants::{CTRL_BYTE_RECENT, CTRL_BYTE_VALID, CTRL_RECENT, CTRL_VALID, TAG_MASK};
use crate::common::{Pte, TlbKey};

/// Decoded control word of one way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ControlWord {
    /// The way holds a translation.
    pub valid: bool,
    /// The way was the last one of its set to be hit or filled.
    pub recent: bool,
    /// Packed `(pid, page)` tag.
    pub tag: u32,
}

impl ControlWord {
    /// An invalid, all-zero control word.
    pub const EMPTY: Self = Self {
        valid: false,
        recent: false,
        tag: 0,
    };

    /// Control word written when `key` is installed: valid, recent, tagged.
    pub const fn installed(key: TlbKey) -> Self {
        Self {
            valid: true,
            recent: true,
            tag: key.tag(),
        }
    }

    /// Unpacks a raw word.
    pub const fn decode(word: u32) -> Self {
        Self {
            valid: word & CTRL_VALID != 0,
            recent: word & CTRL_RECENT != 0,
            tag: word & TAG_MASK,
        }
    }

    /// Packs into a raw word.
    pub const fn encode(self) -> u32 {
        let mut word = self.tag & TAG_MASK;
        if self.valid {
            word |= CTRL_VALID;
        }
        if self.recent {
            word |= CTRL_RECENT;
        }
        word
    }

    /// True if the way is valid and tagged with `key`.
    pub const fn matches(self, key: TlbKey) -> bool {
        self.valid && self.tag == key.tag()
    }

    /// The key this way is tagged with.
    pub const fn key(self) -> TlbKey {
        TlbKey::from_tag(self.tag)
    }
}

/// Sets or clears the recently-used flag in a way's first byte.
pub const fn with_recent(byte: u8, recent: bool) -> u8 {
    if recent {
        byte | CTRL_BYTE_RECENT
    } else {
        byte & !CTRL_BYTE_RECENT
    }
}

/// Clears the valid flag in a way's first byte.
pub const fn without_valid(byte: u8) -> u8 {
    byte & !CTRL_BYTE_VALID
}

/// True if a way's first byte has the valid flag set.
pub const fn byte_valid(byte: u8) -> bool {
    byte & CTRL_BYTE_VALID != 0
}

/// True if a way's first byte has the recently-used flag set.
pub const fn byte_recent(byte: u8) -> bool {
    byte & CTRL_BYTE_RECENT != 0
}

/// Snapshot of one way: control word plus PTE payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Slot {
    /// Decoded control word.
    pub control: ControlWord,
    /// Raw PTE payload.
    pub pte: Pte,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.control.valid {
            return write!(f, "invalid");
        }
        write!(
            f,
            "{} {} [{}]",
            self.control.key(),
            self.pte,
            if self.control.recent { "recent" } else { "-" }
        )
    }
}
