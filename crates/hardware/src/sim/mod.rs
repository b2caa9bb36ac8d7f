//! Workload-driven simulation.
//!
//! This module ties the pieces together for whole-program runs:
//! 1. **Scripts:** Parsing per-process instruction lists.
//! 2. **Dumps:** Optional TLB dumps after every instruction.
//! 3. **Simulator:** One thread per process over a shared TLB and memory manager.

/// TLB dump sink (stdout plus optional file).
pub mod dump;

/// Workload script parser.
pub mod script;

/// Multi-threaded workload runner.
pub mod simulator;

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

pub use self::script::{Instruction, ScriptError};
pub use self::simulator::{ProcessReport, Simulator, Workload};
use crate::common::ConfigError;

/// Failure to set up or run a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A script or dump file could not be accessed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A workload script is malformed.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Two workloads were given the same pid.
    #[error("pid {0} is used by more than one workload")]
    DuplicatePid(u16),

    /// A worker thread panicked.
    #[error("worker for pid {0} panicked")]
    WorkerPanicked(u16),
}

impl Workload {
    /// Parses a workload from script text.
    ///
    /// # Errors
    ///
    /// [`SimError::Script`] on the first malformed line.
    pub fn parse(pid: u16, src: &str) -> Result<Self, SimError> {
        Ok(Self {
            pid,
            program: script::parse(src)?,
        })
    }

    /// Reads and parses a workload script file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the file cannot be read, [`SimError::Script`] if it is malformed.
    pub fn from_file(pid: u16, path: impl AsRef<Path>) -> Result<Self, SimError> {
        Self::parse(pid, &fs::read_to_string(path)?)
    }
}
