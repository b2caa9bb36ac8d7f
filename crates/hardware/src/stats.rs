//! TLB statistics collection and reporting.
//!
//! This module tracks how well the TLB absorbs lookups. It provides:
//! 1. **Counters:** Hits and misses recorded by the CPU-facing access layer.
//! 2. **Derived Metrics:** Access totals and hit rate.
//! 3. **Reporting:** A per-process table in the same layout as the CLI summary.

use std::fmt;
use std::io::{self, Write};
use std::ops::{Add, AddAssign};

/// Hit and miss counters of one process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbStats {
    /// Accesses whose page was found in the TLB.
    pub hits: u64,
    /// Accesses that fell through to the page table.
    pub misses: u64,
}

impl TlbStats {
    /// Total accesses counted.
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of accesses that hit, in `[0, 1]`; zero before any access.
    pub fn hit_rate(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

impl Add for TlbStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            hits: self.hits + rhs.hits,
            misses: self.misses + rhs.misses,
        }
    }
}

impl AddAssign for TlbStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl fmt::Display for TlbStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} hit_rate={:.2}%",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )
    }
}

/// Writes a statistics table for `(pid, stats)` rows followed by a total line.
///
/// # Errors
///
/// Propagates write failures on `out`.
pub fn write_report<W: Write>(out: &mut W, rows: &[(u16, TlbStats)]) -> io::Result<()> {
    writeln!(out, "==========================================================")?;
    writeln!(out, "TLB STATISTICS")?;
    writeln!(out, "==========================================================")?;
    writeln!(out, "  {:<8} {:>10} {:>10} {:>10}", "pid", "hits", "misses", "hit_rate")?;
    let mut total = TlbStats::default();
    for (pid, stats) in rows {
        writeln!(
            out,
            "  {:<8} {:>10} {:>10} {:>9.2}%",
            pid,
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0
        )?;
        total += *stats;
    }
    writeln!(out, "----------------------------------------------------------")?;
    writeln!(
        out,
        "  {:<8} {:>10} {:>10} {:>9.2}%",
        "total",
        total.hits,
        total.misses,
        total.hit_rate() * 100.0
    )
}
