//! Storage device trait.
//!
//! This module defines the `StorageDevice` trait the TLB directory is built on. It provides:
//! 1. **Identification:** `name` and `capacity` of the backing store.
//! 2. **Byte Access:** Fallible single-byte reads and writes, the only primitive operations.
//! 3. **Word Access:** Big-endian 32-bit reads and writes derived from the byte primitives.
//!
//! Word accesses are not atomic. Each byte is its own locked access, so a concurrent writer
//! can interleave between the bytes of a word, and a failed byte write leaves the bytes
//! before it in place.

use crate::common::DeviceError;

/// A byte-addressable device with interior locking.
///
/// All implementors must be `Send + Sync`; one device instance is shared by every
/// virtual CPU.
pub trait StorageDevice: Send + Sync {
    /// Returns a short name for this device (e.g., `"TLB"`).
    fn name(&self) -> &str;

    /// Returns the device size in bytes.
    fn capacity(&self) -> usize;

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Fails when `addr` is out of range or the device lock is poisoned.
    fn read_u8(&self, addr: usize) -> Result<u8, DeviceError>;

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Fails when `addr` is out of range or the device lock is poisoned.
    fn write_u8(&self, addr: usize, val: u8) -> Result<(), DeviceError>;

    /// Reads four bytes starting at `addr`, most significant byte first.
    ///
    /// # Errors
    ///
    /// Fails if any of the four byte reads fails.
    fn read_word(&self, addr: usize) -> Result<u32, DeviceError> {
        let mut word = 0u32;
        for i in 0..4 {
            word = (word << 8) | u32::from(self.read_u8(addr + i)?);
        }
        Ok(word)
    }

    /// Writes four bytes starting at `addr`, most significant byte first.
    ///
    /// # Errors
    ///
    /// Fails on the first byte write that fails; earlier bytes stay written.
    fn write_word(&self, addr: usize, val: u32) -> Result<(), DeviceError> {
        for (i, byte) in val.to_be_bytes().into_iter().enumerate() {
            self.write_u8(addr + i, byte)?;
        }
        Ok(())
    }
}
