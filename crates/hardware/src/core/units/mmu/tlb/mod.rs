//! Translation Lookaside Buffer (TLB).
//!
//! A two-way set-associative cache of page-table entries stored on a byte-addressable
//! [`StorageDevice`]. The device is carved into 16-byte sets of two 8-byte ways; see
//! [`entry`] for the bit layout of a way.
//!
//! Replacement uses one recently-used bit per way: a hit or fill marks its way and clears
//! the sibling, and eviction picks the first valid way without the bit.
//!
//! Every device access is individually locked, but a directory operation as a whole is
//! not. A lookup that reads a set and then marks recency can interleave with an insert or
//! invalidate on the same set from another thread, in which case the recency write lands
//! on whatever the way holds by then.

/// Control word codec and slot snapshots.
pub mod entry;

use tracing::{debug, trace, warn};

use self::entry::{ControlWord, Slot, byte_recent, byte_valid, with_recent, without_valid};
use crate::common::constants::{PTE_OFFSET, SET_PAGE_BITS};
use crate::common::{ConfigError, DeviceError, ENTRY_SIZE, Pte, SET_SIZE, TlbKey, WAYS};
use crate::soc::{StorageDevice, TlbMemory};

/// Result of [`Tlb::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// An invalid way was claimed.
    Filled {
        /// Way index within the set.
        way: usize,
        /// Frame number of the installed PTE.
        frame: u32,
    },
    /// A valid, not recently used way was overwritten.
    Evicted {
        /// Way index within the set.
        way: usize,
        /// Frame number of the installed PTE.
        frame: u32,
        /// Key that occupied the way before.
        victim: TlbKey,
    },
    /// Both ways are valid and marked recently used; nothing was installed.
    NoCandidate,
}

impl InsertOutcome {
    /// Installed frame number, or 0 when nothing was installed.
    pub const fn frame(&self) -> u32 {
        match *self {
            Self::Filled { frame, .. } | Self::Evicted { frame, .. } => frame,
            Self::NoCandidate => 0,
        }
    }

    /// Way that received the entry, if any.
    pub const fn way(&self) -> Option<usize> {
        match *self {
            Self::Filled { way, .. } | Self::Evicted { way, .. } => Some(way),
            Self::NoCandidate => None,
        }
    }
}

/// Result of [`Tlb::sync_process`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Ways whose PTE payload was rewritten.
    pub refreshed: usize,
    /// Ways invalidated because the page is no longer present.
    pub dropped: usize,
}

/// Two-way set-associative TLB directory over a storage device.
#[derive(Debug)]
pub struct Tlb<D: StorageDevice = TlbMemory> {
    device: D,
    num_sets: usize,
}

impl Tlb<TlbMemory> {
    /// Creates a TLB on a freshly allocated device of `size_bytes`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TlbTooSmall`] if the device cannot hold one set.
    pub fn with_capacity(size_bytes: usize) -> Result<Self, ConfigError> {
        Self::new(TlbMemory::new(size_bytes))
    }
}

impl<D: StorageDevice> Tlb<D> {
    /// Creates a TLB over `device`. Trailing bytes past the last whole set are unused.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TlbTooSmall`] if the device cannot hold one set.
    pub fn new(device: D) -> Result<Self, ConfigError> {
        let num_sets = device.capacity() / SET_SIZE;
        if num_sets == 0 {
            return Err(ConfigError::TlbTooSmall(device.capacity()));
        }
        debug!(
            device = device.name(),
            capacity = device.capacity(),
            num_sets,
            "tlb initialized"
        );
        Ok(Self { device, num_sets })
    }

    /// The backing device.
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Number of two-way sets.
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Set selected for `key`: `((pid << 5) + page mod 32) mod num_sets`.
    ///
    /// This folds only the low five page bits in, so distinct keys alias freely.
    pub const fn set_index(&self, key: TlbKey) -> usize {
        let page_low = key.page() as usize % (1 << SET_PAGE_BITS);
        (((key.pid() as usize) << SET_PAGE_BITS) + page_low) % self.num_sets
    }

    const fn way_addr(set: usize, way: usize) -> usize {
        set * SET_SIZE + way * ENTRY_SIZE
    }

    fn read_controls(&self, set: usize) -> Result<[ControlWord; WAYS], DeviceError> {
        let mut words = [ControlWord::EMPTY; WAYS];
        for (way, word) in words.iter_mut().enumerate() {
            *word = ControlWord::decode(self.device.read_word(Self::way_addr(set, way))?);
        }
        Ok(words)
    }

    /// Looks up `key`.
    ///
    /// Only a valid, tag-matching way whose PTE is present counts as a hit. A hit marks
    /// that way recently used and clears the sibling's mark.
    ///
    /// # Returns
    ///
    /// `Ok(Some(frame))` on a hit, `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// Device read failures, kept distinct from a miss. A failed recency write is
    /// logged and the hit still returned.
    pub fn lookup(&self, key: TlbKey) -> Result<Option<u32>, DeviceError> {
        let set = self.set_index(key);
        let controls = self.read_controls(set)?;

        for (way, control) in controls.iter().enumerate() {
            if !control.matches(key) {
                continue;
            }
            let addr = Self::way_addr(set, way);
            let pte = Pte(self.device.read_word(addr + PTE_OFFSET)?);
            if !pte.is_present() {
                trace!(%key, set, way, "tag match on non-present pte");
                continue;
            }

            // Flags are rewritten from the words read above, not re-read. A failed
            // recency write only skews replacement; the translation still stands.
            let sibling = 1 - way;
            let own = with_recent(control.encode().to_be_bytes()[0], true);
            let other = with_recent(controls[sibling].encode().to_be_bytes()[0], false);
            for (target, byte) in [(addr, own), (Self::way_addr(set, sibling), other)] {
                if let Err(err) = self.device.write_u8(target, byte) {
                    warn!(%key, set, addr = target, %err, "tlb recency update failed");
                }
            }

            debug!(%key, set, way, frame = pte.frame(), "tlb hit");
            return Ok(Some(pte.frame()));
        }

        debug!(%key, set, "tlb miss");
        Ok(None)
    }

    /// True if a valid way is tagged with `key`. Unlike [`Tlb::lookup`] this ignores the
    /// PTE and leaves recency alone.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn contains(&self, key: TlbKey) -> Result<bool, DeviceError> {
        let set = self.set_index(key);
        Ok(self.read_controls(set)?.iter().any(|c| c.matches(key)))
    }

    fn install(&self, set: usize, way: usize, key: TlbKey, pte: Pte) -> Result<(), DeviceError> {
        let addr = Self::way_addr(set, way);
        self.device
            .write_word(addr, ControlWord::installed(key).encode())?;

        let sibling = Self::way_addr(set, 1 - way);
        let byte = self.device.read_u8(sibling)?;
        self.device.write_u8(sibling, with_recent(byte, false))?;

        self.device.write_word(addr + PTE_OFFSET, pte.bits())
    }

    /// Installs `pte` for `key`.
    ///
    /// An invalid way is preferred; otherwise the first way without the recently-used
    /// mark is evicted. When both ways are valid and marked, nothing changes and
    /// [`InsertOutcome::NoCandidate`] is returned.
    ///
    /// The directory does not look for an existing entry for `key` first, so callers
    /// must not insert a key that is already cached.
    ///
    /// # Errors
    ///
    /// Device failures. A failure part-way through leaves the partial write in place.
    pub fn insert(&self, key: TlbKey, pte: Pte) -> Result<InsertOutcome, DeviceError> {
        let set = self.set_index(key);

        for way in 0..WAYS {
            let byte = self.device.read_u8(Self::way_addr(set, way))?;
            if !byte_valid(byte) {
                self.install(set, way, key, pte)?;
                debug!(%key, set, way, frame = pte.frame(), "tlb fill");
                return Ok(InsertOutcome::Filled {
                    way,
                    frame: pte.frame(),
                });
            }
        }

        for way in 0..WAYS {
            let word = self.device.read_word(Self::way_addr(set, way))?;
            if !byte_recent(word.to_be_bytes()[0]) {
                let victim = ControlWord::decode(word).key();
                self.install(set, way, key, pte)?;
                debug!(%key, %victim, set, way, frame = pte.frame(), "tlb evict");
                return Ok(InsertOutcome::Evicted {
                    way,
                    frame: pte.frame(),
                    victim,
                });
            }
        }

        warn!(%key, set, "no eviction candidate: both ways marked recently used");
        Ok(InsertOutcome::NoCandidate)
    }

    /// Removes `key`, zeroing the whole way.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a way was cleared, `Ok(false)` if `key` was not cached.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn invalidate(&self, key: TlbKey) -> Result<bool, DeviceError> {
        let set = self.set_index(key);
        let controls = self.read_controls(set)?;

        if let Some(way) = controls.iter().position(|c| c.matches(key)) {
            self.zero_way(set, way)?;
            debug!(%key, set, way, "tlb invalidate");
            return Ok(true);
        }
        Ok(false)
    }

    /// Clears only the valid flag of the way caching `key`, leaving tag and PTE bytes.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a way was cleared, `Ok(false)` if `key` was not cached.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn clear_valid(&self, key: TlbKey) -> Result<bool, DeviceError> {
        let set = self.set_index(key);
        for way in 0..WAYS {
            let addr = Self::way_addr(set, way);
            let word = self.device.read_word(addr)?;
            if ControlWord::decode(word).matches(key) {
                self.device.write_u8(addr, without_valid(word.to_be_bytes()[0]))?;
                debug!(%key, set, way, "tlb valid bit cleared");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn zero_way(&self, set: usize, way: usize) -> Result<(), DeviceError> {
        let addr = Self::way_addr(set, way);
        self.device.write_word(addr, 0)?;
        self.device.write_word(addr + PTE_OFFSET, 0)
    }

    /// Reads one way without touching recency.
    ///
    /// # Errors
    ///
    /// [`DeviceError::OutOfRange`] if `set` is not below [`Tlb::num_sets`] or `way` is
    /// not below [`WAYS`]; other device failures.
    pub fn read_slot(&self, set: usize, way: usize) -> Result<Slot, DeviceError> {
        if set >= self.num_sets || way >= WAYS {
            return Err(DeviceError::OutOfRange {
                addr: set
                    .saturating_mul(SET_SIZE)
                    .saturating_add(way.saturating_mul(ENTRY_SIZE)),
                capacity: self.device.capacity(),
            });
        }
        let addr = Self::way_addr(set, way);
        Ok(Slot {
            control: ControlWord::decode(self.device.read_word(addr)?),
            pte: Pte(self.device.read_word(addr + PTE_OFFSET)?),
        })
    }

    /// Snapshot of every valid way as `(set, way, slot)`.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn entries(&self) -> Result<Vec<(usize, usize, Slot)>, DeviceError> {
        let mut out = Vec::new();
        for set in 0..self.num_sets {
            for way in 0..WAYS {
                let slot = self.read_slot(set, way)?;
                if slot.control.valid {
                    out.push((set, way, slot));
                }
            }
        }
        Ok(out)
    }

    /// Invalidates every valid way accepted by `filter`, returning how many were cleared.
    fn flush_where(&self, filter: impl Fn(TlbKey) -> bool) -> Result<usize, DeviceError> {
        let mut cleared = 0;
        for set in 0..self.num_sets {
            for (way, control) in self.read_controls(set)?.iter().enumerate() {
                if control.valid && filter(control.key()) {
                    self.zero_way(set, way)?;
                    cleared += 1;
                }
            }
        }
        Ok(cleared)
    }

    /// Invalidates every entry.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn flush(&self) -> Result<usize, DeviceError> {
        let cleared = self.flush_where(|_| true)?;
        debug!(cleared, "tlb flush");
        Ok(cleared)
    }

    /// Invalidates every entry belonging to `pid`.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn flush_process(&self, pid: u16) -> Result<usize, DeviceError> {
        let cleared = self.flush_where(|key| key.pid() == pid)?;
        debug!(pid, cleared, "tlb flush process");
        Ok(cleared)
    }

    /// Rewrites the cached PTE of every entry belonging to `pid` from `page_table`.
    ///
    /// Entries whose page is no longer present are invalidated. Recency is untouched.
    ///
    /// # Errors
    ///
    /// Device failures.
    pub fn sync_process(
        &self,
        pid: u16,
        page_table: impl Fn(u32) -> Pte,
    ) -> Result<SyncReport, DeviceError> {
        let mut report = SyncReport::default();
        for set in 0..self.num_sets {
            for (way, control) in self.read_controls(set)?.iter().enumerate() {
                let key = control.key();
                if !control.valid || key.pid() != pid {
                    continue;
                }
                let pte = page_table(key.page());
                if pte.is_present() {
                    self.device
                        .write_word(Self::way_addr(set, way) + PTE_OFFSET, pte.bits())?;
                    report.refreshed += 1;
                } else {
                    self.zero_way(set, way)?;
                    report.dropped += 1;
                }
            }
        }
        debug!(pid, ?report, "tlb sync");
        Ok(report)
    }
}
