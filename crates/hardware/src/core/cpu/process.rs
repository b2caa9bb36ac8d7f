//! Process control block.
//!
//! The CPU-facing layer only needs a process's id and somewhere to count TLB
//! outcomes. Counters sit behind their own lock and every increment takes it, so
//! concurrent virtual CPUs running the same process never lose an update.

use std::sync::{Mutex, PoisonError};

use crate::stats::TlbStats;

/// A process as seen by the TLB: id plus hit/miss counters.
#[derive(Debug)]
pub struct Process {
    pid: u16,
    stats: Mutex<TlbStats>,
}

impl Process {
    /// Creates a process with zeroed counters.
    pub fn new(pid: u16) -> Self {
        Self {
            pid,
            stats: Mutex::new(TlbStats::default()),
        }
    }

    /// Process id.
    pub const fn pid(&self) -> u16 {
        self.pid
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> TlbStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts one TLB hit.
    pub fn record_hit(&self) {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).hits += 1;
    }

    /// Counts one TLB miss.
    pub fn record_miss(&self) {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).misses += 1;
    }
}
