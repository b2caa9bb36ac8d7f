//! TLB Memory Device Tests.
//!
//! Verifies the byte-addressable device the directory is stored on:
//! - Zero fill and single-byte access
//! - Big-endian word codec built from byte accesses
//! - Explicit out-of-range failures and partial word writes
//! - Byte and binary dumps, including the file sink

use std::io::Read;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::mocks::device::FaultyDevice;
use tlbsim_core::common::DeviceError;
use tlbsim_core::config::GeneralConfig;
use tlbsim_core::sim::dump::DumpSink;
use tlbsim_core::soc::{StorageDevice, TlbMemory};

// ══════════════════════════════════════════════════════════
// 1. Byte Access
// ══════════════════════════════════════════════════════════

#[test]
fn new_device_is_zero_filled() {
    let mem = TlbMemory::new(64);
    assert_eq!(mem.capacity(), 64);
    assert_eq!(mem.name(), "TLB");
    for addr in 0..64 {
        assert_eq!(mem.read_u8(addr), Ok(0));
    }
}

#[test]
fn byte_write_is_visible_through_clones() {
    let mem = TlbMemory::new(16);
    let other = mem.clone();
    mem.write_u8(3, 0xAB).unwrap();
    assert_eq!(other.read_u8(3), Ok(0xAB));
}

#[test]
fn out_of_range_access_fails_explicitly() {
    let mem = TlbMemory::new(16);
    let expected = Err(DeviceError::OutOfRange {
        addr: 16,
        capacity: 16,
    });
    assert_eq!(mem.read_u8(16), expected);
    assert_eq!(mem.write_u8(16, 1), expected.map(drop));
}

#[test]
fn clear_zero_fills() {
    let mem = TlbMemory::new(8);
    mem.write_word(0, u32::MAX).unwrap();
    mem.clear().unwrap();
    assert_eq!(mem.read_word(0), Ok(0));
}

// ══════════════════════════════════════════════════════════
// 2. Word Codec
// ══════════════════════════════════════════════════════════

#[test]
fn word_is_stored_most_significant_byte_first() {
    let mem = TlbMemory::new(8);
    mem.write_word(4, 0x8123_4567).unwrap();
    assert_eq!(mem.read_u8(4), Ok(0x81));
    assert_eq!(mem.read_u8(5), Ok(0x23));
    assert_eq!(mem.read_u8(6), Ok(0x45));
    assert_eq!(mem.read_u8(7), Ok(0x67));
}

#[test]
fn word_straddling_the_end_fails() {
    let mem = TlbMemory::new(8);
    assert!(matches!(
        mem.read_word(6),
        Err(DeviceError::OutOfRange { addr: 8, .. })
    ));
}

#[test]
fn failed_word_write_keeps_earlier_bytes() {
    let dev = FaultyDevice::new(8);
    dev.fail_write(2);
    assert_eq!(dev.write_word(0, 0xAABB_CCDD), Err(DeviceError::Poisoned));
    assert_eq!(dev.inner().read_u8(0), Ok(0xAA));
    assert_eq!(dev.inner().read_u8(1), Ok(0xBB));
    assert_eq!(dev.inner().read_u8(2), Ok(0));
    assert_eq!(dev.inner().read_u8(3), Ok(0));
}

proptest! {
    #[test]
    fn word_round_trips(value in any::<u32>(), slot in 0usize..4) {
        let mem = TlbMemory::new(16);
        let addr = slot * 4;
        mem.write_word(addr, value).unwrap();
        prop_assert_eq!(mem.read_word(addr).unwrap(), value);
    }

    #[test]
    fn word_round_trips_with_top_bit_set(low in 0u32..(1 << 31)) {
        let mem = TlbMemory::new(4);
        let value = (1 << 31) | low;
        mem.write_word(0, value).unwrap();
        prop_assert_eq!(mem.read_word(0).unwrap(), value);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Dumps
// ══════════════════════════════════════════════════════════

#[test]
fn byte_dump_lists_only_non_zero_bytes() {
    let mem = TlbMemory::new(32);
    mem.write_u8(0x11, 7).unwrap();
    let mut out = Vec::new();
    mem.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "===== TLB MEMORY DUMP =====\nBYTE 00000011: 7\n===== TLB MEMORY END-DUMP =====\n"
    );
}

#[test]
fn bin_dump_prints_aligned_words_as_bits() {
    let mem = TlbMemory::new(16);
    mem.write_word(8, 0xC000_4005).unwrap();
    let mut out = Vec::new();
    mem.bin_dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "(8) 00000008: (3221241861) 11000000000000000100000000000101"
    );
}

#[test]
fn dumps_do_not_change_the_device() {
    let mem = TlbMemory::new(16);
    mem.write_word(0, 0xDEAD_BEEF).unwrap();
    mem.dump(&mut std::io::sink()).unwrap();
    mem.bin_dump(&mut std::io::sink()).unwrap();
    assert_eq!(mem.read_word(0), Ok(0xDEAD_BEEF));
}

#[test]
fn disabled_sink_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.txt");
    let general = GeneralConfig {
        dump: false,
        dump_file: Some(path.clone()),
    };
    let sink = DumpSink::from_config(&general).unwrap();
    assert!(!sink.is_enabled());
    sink.emit("header", &TlbMemory::new(16)).unwrap();
    assert!(!path.exists());
}

#[test]
fn enabled_sink_appends_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.txt");
    let general = GeneralConfig {
        dump: true,
        dump_file: Some(path.clone()),
    };
    let sink = DumpSink::from_config(&general).unwrap();
    let mem = TlbMemory::new(16);
    mem.write_word(0, 1).unwrap();
    sink.emit("first", &mem).unwrap();
    sink.emit("second", &mem).unwrap();

    let mut text = String::new();
    let _ = std::fs::File::open(&path)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert!(text.starts_with("first\n===== TLB MEMORY BIN DUMP =====\n"));
    assert!(text.contains("second\n"));
    assert_eq!(text.matches("(0) 00000000: (1)").count(), 2);
}
