//! Locked byte buffer.
//!
//! This module provides the zero-filled storage behind the TLB device. The whole buffer
//! sits behind one mutex, so every byte access across every thread is serialized.
//! There is no per-address or per-set locking.

use std::sync::{Mutex, MutexGuard};

use crate::common::DeviceError;

/// A fixed-size byte array guarded by a single lock.
#[derive(Debug)]
pub struct StorageBuffer {
    bytes: Mutex<Box<[u8]>>,
    size: usize,
}

impl StorageBuffer {
    /// Allocates a zero-filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0u8; size].into_boxed_slice()),
            size,
        }
    }

    /// Returns the size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns true for a zero-sized buffer.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn check(&self, addr: usize) -> Result<(), DeviceError> {
        if addr >= self.size {
            return Err(DeviceError::OutOfRange {
                addr,
                capacity: self.size,
            });
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<[u8]>>, DeviceError> {
        self.bytes.lock().map_err(|_| DeviceError::Poisoned)
    }

    /// Reads a single byte under the buffer lock.
    ///
    /// # Errors
    ///
    /// [`DeviceError::OutOfRange`] past the end, [`DeviceError::Poisoned`] if the lock is poisoned.
    pub fn read_u8(&self, addr: usize) -> Result<u8, DeviceError> {
        self.check(addr)?;
        let bytes = self.lock()?;
        Ok(bytes[addr])
    }

    /// Writes a single byte under the buffer lock.
    ///
    /// # Errors
    ///
    /// [`DeviceError::OutOfRange`] past the end, [`DeviceError::Poisoned`] if the lock is poisoned.
    pub fn write_u8(&self, addr: usize, val: u8) -> Result<(), DeviceError> {
        self.check(addr)?;
        let mut bytes = self.lock()?;
        bytes[addr] = val;
        Ok(())
    }

    /// Copies the whole buffer while holding the lock once.
    ///
    /// # Errors
    ///
    /// [`DeviceError::Poisoned`] if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<u8>, DeviceError> {
        Ok(self.lock()?.to_vec())
    }

    /// Zero-fills the buffer.
    ///
    /// # Errors
    ///
    /// [`DeviceError::Poisoned`] if the lock is poisoned.
    pub fn clear(&self) -> Result<(), DeviceError> {
        self.lock()?.fill(0);
        Ok(())
    }
}
