//! Paged memory manager tests.
//!
//! Verifies region layout, frame accounting, the byte data path and the
//! failure cases the access layer propagates upstream.

use pretty_assertions::assert_eq;
use rstest::rstest;

use tlbsim_core::common::{ConfigError, Pte, VirtAddr, VmError};
use tlbsim_core::core::units::mmu::{MemoryManager, PagedMemory, Region};

fn manager(ram: usize) -> PagedMemory {
    PagedMemory::new(ram, 1 << 14).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn frames_follow_ram_size() {
    assert_eq!(manager(4096).free_frames(), 16);
}

#[test]
fn frames_are_capped_by_pte_field() {
    assert_eq!(manager(4 * 1024 * 1024).free_frames(), 0x2000);
}

#[test]
fn ram_below_one_page_rejected() {
    assert!(matches!(
        PagedMemory::new(255, 16),
        Err(ConfigError::RamTooSmall(255))
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Allocation
// ══════════════════════════════════════════════════════════

#[test]
fn regions_are_laid_out_back_to_back() {
    let mm = manager(4096);
    assert_eq!(mm.alloc(1, 0, 0, 300), Ok(VirtAddr(0)));
    assert_eq!(mm.alloc(1, 0, 1, 100), Ok(VirtAddr(300)));
    assert_eq!(mm.region(1, 0), Some(Region::new(0, 300)));
    assert_eq!(mm.region(1, 1), Some(Region::new(300, 100)));
}

#[test]
fn alloc_maps_every_spanned_page() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 300).unwrap();
    assert!(mm.page_table_entry(1, 0).is_present());
    assert!(mm.page_table_entry(1, 1).is_present());
    assert_eq!(mm.page_table_entry(1, 2), Pte::EMPTY);
    assert_eq!(mm.free_frames(), 14);
}

#[test]
fn processes_get_distinct_frames() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 10).unwrap();
    let _ = mm.alloc(2, 0, 0, 10).unwrap();
    assert_ne!(
        mm.page_table_entry(1, 0).frame(),
        mm.page_table_entry(2, 0).frame()
    );
}

#[test]
fn region_id_cannot_be_reused() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 3, 10).unwrap();
    assert_eq!(mm.alloc(1, 0, 3, 10), Err(VmError::RegionInUse(3)));
}

#[test]
fn exhausted_ram_rolls_back() {
    let mm = manager(512);
    assert_eq!(
        mm.alloc(1, 0, 0, 600),
        Err(VmError::OutOfMemory {
            region: 0,
            size: 600
        })
    );
    assert_eq!(mm.free_frames(), 2);
    assert_eq!(mm.page_table_entry(1, 0), Pte::EMPTY);
    assert_eq!(mm.region(1, 0), None);
}

#[test]
fn virtual_page_limit_is_enforced() {
    let mm = PagedMemory::new(64 * 1024, 4).unwrap();
    assert!(mm.alloc(1, 0, 0, 4 * 256).is_ok());
    assert!(matches!(
        mm.alloc(1, 0, 1, 1),
        Err(VmError::OutOfMemory { region: 1, .. })
    ));
}

#[rstest]
#[case(1)]
#[case(7)]
fn only_area_zero_is_supported(#[case] vmaid: u32) {
    let mm = manager(4096);
    assert_eq!(mm.alloc(1, vmaid, 0, 10), Err(VmError::UnknownArea(vmaid)));
}

// ══════════════════════════════════════════════════════════
// 3. Data Path
// ══════════════════════════════════════════════════════════

#[test]
fn bytes_round_trip_across_pages() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 600).unwrap();
    for offset in [0, 255, 256, 599] {
        mm.write(1, 0, 0, offset, offset as u8 ^ 0x5A).unwrap();
    }
    for offset in [0, 255, 256, 599] {
        assert_eq!(mm.read(1, 0, 0, offset), Ok(offset as u8 ^ 0x5A));
    }
}

#[test]
fn processes_do_not_share_data() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 10).unwrap();
    let _ = mm.alloc(2, 0, 0, 10).unwrap();
    mm.write(1, 0, 0, 4, 0xEE).unwrap();
    assert_eq!(mm.read(2, 0, 0, 4), Ok(0));
}

#[test]
fn access_past_region_end_fails() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 10).unwrap();
    assert_eq!(
        mm.read(1, 0, 0, 10),
        Err(VmError::OutOfBounds {
            region: 0,
            offset: 10
        })
    );
}

#[test]
fn unknown_process_and_region_fail() {
    let mm = manager(4096);
    assert_eq!(mm.read(9, 0, 0, 0), Err(VmError::UnknownProcess(9)));
    let _ = mm.alloc(9, 0, 0, 10).unwrap();
    assert_eq!(mm.write(9, 0, 4, 0, 1), Err(VmError::UnknownRegion(4)));
}

// ══════════════════════════════════════════════════════════
// 4. Release
// ══════════════════════════════════════════════════════════

#[test]
fn free_keeps_pages_shared_with_live_regions() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 300).unwrap();
    let _ = mm.alloc(1, 0, 1, 100).unwrap();
    assert_eq!(mm.free_frames(), 14);

    mm.free(1, 0, 0).unwrap();
    assert_eq!(mm.free_frames(), 15);
    assert_eq!(mm.page_table_entry(1, 0), Pte::EMPTY);
    assert!(mm.page_table_entry(1, 1).is_present());
    assert_eq!(mm.region(1, 0), None);
}

#[test]
fn free_unknown_region_fails() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 10).unwrap();
    assert_eq!(mm.free(1, 0, 5), Err(VmError::UnknownRegion(5)));
    assert_eq!(mm.free(2, 0, 0), Err(VmError::UnknownProcess(2)));
}

#[test]
fn remove_process_returns_all_frames() {
    let mm = manager(4096);
    let _ = mm.alloc(1, 0, 0, 1000).unwrap();
    assert_eq!(mm.free_frames(), 12);
    mm.remove_process(1);
    assert_eq!(mm.free_frames(), 16);
    assert_eq!(mm.region(1, 0), None);
}

#[test]
fn region_end_is_clipped_at_the_top_of_the_address_space() {
    let region = Region::new(u32::MAX - 9, 100);
    assert_eq!(region.end, VirtAddr(u32::MAX));
    assert!(region.contains(VirtAddr(u32::MAX - 1)));
    assert_eq!(region.pages(), Some((u32::MAX / 256)..=(u32::MAX / 256)));
}
