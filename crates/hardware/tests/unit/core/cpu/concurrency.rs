//! Concurrency tests.
//!
//! Several threads stand in for virtual CPUs sharing one `Cpu`. Counters must not
//! lose updates, and racing directory operations must never fail or corrupt the
//! device layout even though they are not atomic as a whole.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, key, pte};
use tlbsim_core::Tlb;
use tlbsim_core::core::Process;
use tlbsim_core::stats::TlbStats;

const ITERATIONS: u64 = 5_000;

#[test]
fn two_threads_reading_one_page_count_every_hit() {
    let ctx = TestContext::new();
    let process = ctx.process_with_region(1, 0, 100);

    thread::scope(|s| {
        for t in 0..2u32 {
            let (cpu, process) = (&ctx.cpu, &process);
            let _ = s.spawn(move || {
                for _ in 0..ITERATIONS {
                    assert_eq!(cpu.read(process, 0, t), Ok(0));
                }
            });
        }
    });

    assert_eq!(
        process.stats(),
        TlbStats {
            hits: 2 * ITERATIONS,
            misses: 0
        }
    );
}

#[test]
fn one_read_per_thread_increments_by_exactly_two() {
    for _ in 0..200 {
        let ctx = TestContext::new();
        let process = ctx.process_with_region(3, 0, 16);
        thread::scope(|s| {
            for _ in 0..2 {
                let (cpu, process) = (&ctx.cpu, &process);
                let _ = s.spawn(move || cpu.read(process, 0, 0));
            }
        });
        assert_eq!(process.stats().hits, 2);
    }
}

#[test]
fn processes_on_separate_threads_keep_separate_counts() {
    let ctx = Arc::new(TestContext::new());
    let handles: Vec<_> = (1..=4u16)
        .map(|pid| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let process = ctx.process_with_region(pid, 0, 600);
                for i in 0..u32::from(pid) * 100 {
                    ctx.cpu.write(&process, i as u8, 0, i % 600).unwrap();
                }
                process.stats()
            })
        })
        .collect();

    for (pid, handle) in (1..=4u64).zip(handles) {
        assert_eq!(handle.join().unwrap().accesses(), pid * 100);
    }
}

#[test]
fn racing_directory_operations_never_fail() {
    let tlb = Tlb::with_capacity(16).unwrap();

    thread::scope(|s| {
        let tlb = &tlb;
        let _ = s.spawn(move || {
            for i in 0..ITERATIONS {
                let page = (i % 4) as u32;
                let _ = tlb.insert(key(1, page), pte(page)).unwrap();
            }
        });
        let _ = s.spawn(move || {
            for i in 0..ITERATIONS {
                let _ = tlb.lookup(key(1, (i % 4) as u32)).unwrap();
            }
        });
        let _ = s.spawn(move || {
            for i in 0..ITERATIONS {
                let _ = tlb.invalidate(key(1, (i % 4) as u32)).unwrap();
            }
        });
    });

    // Interleavings may leave stale flags behind; a flush always recovers the set.
    let _ = tlb.flush().unwrap();
    assert!(tlb.entries().unwrap().is_empty());
    let _ = tlb.insert(key(1, 2), pte(2)).unwrap();
    assert_eq!(tlb.lookup(key(1, 2)), Ok(Some(2)));
}

#[test]
fn shared_process_counters_do_not_lose_updates() {
    let process = Process::new(9);
    thread::scope(|s| {
        for t in 0..4 {
            let process = &process;
            let _ = s.spawn(move || {
                for _ in 0..ITERATIONS {
                    if t % 2 == 0 {
                        process.record_hit();
                    } else {
                        process.record_miss();
                    }
                }
            });
        }
    });
    assert_eq!(
        process.stats(),
        TlbStats {
            hits: 2 * ITERATIONS,
            misses: 2 * ITERATIONS
        }
    );
}
