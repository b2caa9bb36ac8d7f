//! TLB storage device.
//!
//! This module implements the physical storage the TLB directory lives in. It provides:
//! 1. **Buffer:** A zero-filled, lock-guarded byte array (`StorageBuffer`).
//! 2. **Device:** `TlbMemory`, a cloneable handle implementing [`StorageDevice`].
//! 3. **Diagnostics:** Byte and binary dumps of every non-zero location.

/// Lock-guarded byte storage.
pub mod buffer;

use std::io::{self, Write};
use std::sync::Arc;

use self::buffer::StorageBuffer;
use crate::common::DeviceError;
use crate::soc::traits::StorageDevice;

/// Shared handle to the TLB's backing memory.
///
/// Clones refer to the same storage; the device is allocated once and freed when the
/// last handle is dropped.
#[derive(Clone, Debug)]
pub struct TlbMemory {
    buffer: Arc<StorageBuffer>,
}

impl TlbMemory {
    /// Allocates a zero-filled device of `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Arc::new(StorageBuffer::new(max_size)),
        }
    }

    /// Zero-fills the device.
    ///
    /// # Errors
    ///
    /// Fails if the device lock is poisoned.
    pub fn clear(&self) -> Result<(), DeviceError> {
        self.buffer.clear()
    }

    /// Writes every non-zero byte as `BYTE <addr>: <value>`.
    ///
    /// # Errors
    ///
    /// Propagates write failures on `out`; a poisoned device is reported as an I/O error.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let bytes = self.buffer.snapshot().map_err(io::Error::other)?;
        writeln!(out, "===== TLB MEMORY DUMP =====")?;
        for (addr, byte) in bytes.iter().enumerate().filter(|(_, b)| **b != 0) {
            writeln!(out, "BYTE {addr:08x}: {byte}")?;
        }
        writeln!(out, "===== TLB MEMORY END-DUMP =====")
    }

    /// Writes every non-zero aligned word as its address and 32-character bit string.
    ///
    /// # Errors
    ///
    /// Propagates write failures on `out`; a poisoned device is reported as an I/O error.
    pub fn bin_dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let bytes = self.buffer.snapshot().map_err(io::Error::other)?;
        writeln!(out, "===== TLB MEMORY BIN DUMP =====")?;
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if word != 0 {
                let addr = i * 4;
                writeln!(out, "({addr}) {addr:08x}: ({word}) {word:032b}")?;
            }
        }
        writeln!(out, "===== TLB MEMORY END-DUMP =====")
    }
}

impl StorageDevice for TlbMemory {
    fn name(&self) -> &str {
        "TLB"
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn read_u8(&self, addr: usize) -> Result<u8, DeviceError> {
        self.buffer.read_u8(addr)
    }

    fn write_u8(&self, addr: usize, val: u8) -> Result<(), DeviceError> {
        self.buffer.write_u8(addr, val)
    }
}
