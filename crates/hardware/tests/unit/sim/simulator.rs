//! Simulator tests.
//!
//! Runs whole workloads through `Simulator` and checks the per-process reports,
//! cleanup after each process, and the optional dump file.

use std::fs;

use pretty_assertions::assert_eq;

use crate::common::harness::init_tracing;
use tlbsim_core::config::Config;
use tlbsim_core::sim::{SimError, Simulator, Workload};
use tlbsim_core::stats::TlbStats;

fn simulator() -> Simulator {
    init_tracing();
    let mut config = Config::default();
    config.memory.ram_size = 64 * 1024;
    Simulator::new(&config).unwrap()
}

const SCAN: &str = "\
alloc 300 0
write 100 0 20
read 0 20
read 0 299
free 0
";

#[test]
fn single_process_report() {
    let sim = simulator();
    let reports = sim.run(&[Workload::parse(1, SCAN).unwrap()]).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].pid, 1);
    assert_eq!(reports[0].failed, 0);
    assert_eq!(reports[0].stats, TlbStats { hits: 3, misses: 0 });
}

#[test]
fn rejected_instructions_are_counted_and_skipped() {
    let sim = simulator();
    let src = "read 0 0\nalloc 10 0\nalloc 10 0\nread 0 50\nread 0 5\n";
    let report = sim.run_process(&Workload::parse(2, src).unwrap());
    assert_eq!(report.failed, 3);
    assert_eq!(report.stats, TlbStats { hits: 1, misses: 0 });
}

#[test]
fn processes_run_concurrently_and_report_in_order() {
    let sim = simulator();
    let workloads: Vec<_> = (1..=3)
        .map(|pid| Workload::parse(pid, SCAN).unwrap())
        .collect();
    let reports = sim.run(&workloads).unwrap();
    let pids: Vec<u16> = reports.iter().map(|r| r.pid).collect();
    assert_eq!(pids, vec![1, 2, 3]);
    for report in &reports {
        assert_eq!(report.failed, 0);
        assert_eq!(report.stats.accesses(), 3);
    }
}

#[test]
fn finished_processes_release_tlb_and_memory() {
    let sim = simulator();
    let frames = sim.cpu().memory_manager().free_frames();
    let _ = sim
        .run(&[Workload::parse(5, "alloc 1000 0\nread 0 999\n").unwrap()])
        .unwrap();
    assert!(sim.cpu().tlb().entries().unwrap().is_empty());
    assert_eq!(sim.cpu().memory_manager().free_frames(), frames);
}

#[test]
fn duplicate_pids_are_rejected() {
    let sim = simulator();
    let w = Workload::parse(7, SCAN).unwrap();
    assert!(matches!(
        sim.run(&[w.clone(), w]),
        Err(SimError::DuplicatePid(7))
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.tlb.size_bytes = 8;
    assert!(matches!(Simulator::new(&config), Err(SimError::Config(_))));
}

#[test]
fn dump_file_receives_a_dump_per_instruction() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tlb.dump");
    let mut config = Config::default();
    config.general.dump = true;
    config.general.dump_file = Some(path.clone());
    let sim = Simulator::new(&config).unwrap();

    let _ = sim
        .run(&[Workload::parse(1, "alloc 10 0\nread 0 1\n").unwrap()])
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("===== TLB MEMORY BIN DUMP =====").count(), 2);
    assert!(text.contains("pid 1 after `alloc 10 0`"));
    assert!(text.contains("pid 1 after `read 0 1`"));
}

#[test]
fn workload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p1.txt");
    fs::write(&path, SCAN).unwrap();
    let w = Workload::from_file(1, &path).unwrap();
    assert_eq!(w.program.len(), 5);

    assert!(matches!(
        Workload::from_file(1, dir.path().join("missing.txt")),
        Err(SimError::Io(_))
    ));
    fs::write(&path, "bogus\n").unwrap();
    assert!(matches!(
        Workload::from_file(1, &path),
        Err(SimError::Script(_))
    ));
}
