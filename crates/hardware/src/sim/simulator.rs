//! Simulator: a shared TLB, the paged memory manager, and one thread per process.
//!
//! Each workload runs on its own OS thread, standing in for a virtual CPU, against the
//! same `Cpu`. Instructions that the memory manager rejects are logged and skipped, the
//! way a process keeps running after a failed system call.

use std::thread;

use tracing::{info, warn};

use super::SimError;
use super::dump::DumpSink;
use super::script::Instruction;
use crate::config::Config;
use crate::core::units::mmu::{PagedMemory, Tlb};
use crate::core::{Cpu, Process};
use crate::soc::TlbMemory;
use crate::stats::TlbStats;

/// A process id and the instructions it executes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Process id.
    pub pid: u16,
    /// Instructions in program order.
    pub program: Vec<Instruction>,
}

/// Outcome of one process's run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Process id.
    pub pid: u16,
    /// Final TLB counters.
    pub stats: TlbStats,
    /// Instructions the memory manager rejected.
    pub failed: usize,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    cpu: Cpu<PagedMemory, TlbMemory>,
    sink: DumpSink,
}

impl Simulator {
    /// Builds the TLB, memory manager and dump sink described by `config`.
    ///
    /// # Errors
    ///
    /// Invalid geometry or an unopenable dump file.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let tlb = Tlb::with_capacity(config.tlb.size_bytes)?;
        let mm = PagedMemory::new(config.memory.ram_size, config.memory.max_pages)?;
        let sink = DumpSink::from_config(&config.general)?;
        info!(
            tlb_bytes = config.tlb.size_bytes,
            sets = tlb.num_sets(),
            ram_bytes = config.memory.ram_size,
            "simulator ready"
        );
        Ok(Self {
            cpu: Cpu::new(tlb, mm),
            sink,
        })
    }

    /// The shared CPU front end.
    pub const fn cpu(&self) -> &Cpu<PagedMemory, TlbMemory> {
        &self.cpu
    }

    fn step(&self, process: &Process, inst: Instruction) -> bool {
        let result = match inst {
            Instruction::Alloc { size, region } => self.cpu.alloc(process, size, region).map(drop),
            Instruction::Free { region } => self.cpu.free(process, region),
            Instruction::Read { region, offset } => {
                self.cpu.read(process, region, offset).map(drop)
            }
            Instruction::Write {
                value,
                region,
                offset,
            } => self.cpu.write(process, value, region, offset),
        };

        if let Err(err) = &result {
            warn!(pid = process.pid(), %inst, %err, "instruction failed");
        }
        let header = format!("pid {} after `{inst}`", process.pid());
        if let Err(err) = self.sink.emit(&header, self.cpu.tlb().device()) {
            warn!(%err, "tlb dump failed");
        }
        result.is_ok()
    }

    /// Runs one workload to completion, then drops its TLB entries and address space.
    pub fn run_process(&self, workload: &Workload) -> ProcessReport {
        let process = Process::new(workload.pid);
        let mut failed = 0;
        for inst in &workload.program {
            if !self.step(&process, *inst) {
                failed += 1;
            }
        }

        if let Err(err) = self.cpu.flush_process(&process) {
            warn!(pid = process.pid(), %err, "tlb flush failed");
        }
        self.cpu.memory_manager().remove_process(process.pid());

        let stats = process.stats();
        info!(pid = process.pid(), %stats, failed, "process finished");
        ProcessReport {
            pid: process.pid(),
            stats,
            failed,
        }
    }

    /// Runs every workload on its own thread and collects reports in input order.
    ///
    /// # Errors
    ///
    /// [`SimError::DuplicatePid`] if two workloads share a pid, or
    /// [`SimError::WorkerPanicked`] if a worker thread panicked.
    pub fn run(&self, workloads: &[Workload]) -> Result<Vec<ProcessReport>, SimError> {
        for (i, w) in workloads.iter().enumerate() {
            if workloads[..i].iter().any(|other| other.pid == w.pid) {
                return Err(SimError::DuplicatePid(w.pid));
            }
        }

        thread::scope(|scope| {
            let handles: Vec<_> = workloads
                .iter()
                .map(|w| (w.pid, scope.spawn(move || self.run_process(w))))
                .collect();
            handles
                .into_iter()
                .map(|(pid, handle)| handle.join().map_err(|_| SimError::WorkerPanicked(pid)))
                .collect()
        })
    }
}
