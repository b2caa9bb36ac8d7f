//! TLB dump sink.
//!
//! Renders binary dumps of the TLB device to stdout and, when configured, appends the
//! same text to a trace file. Dumps only read the device.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::config::GeneralConfig;
use crate::soc::TlbMemory;

/// Where TLB dumps go.
#[derive(Debug, Default)]
pub struct DumpSink {
    enabled: bool,
    file: Option<Mutex<File>>,
}

impl DumpSink {
    /// A sink that drops every dump.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Builds a sink from the `general` config, opening `dump_file` in append mode.
    ///
    /// # Errors
    ///
    /// Fails if the dump file cannot be opened.
    pub fn from_config(general: &GeneralConfig) -> io::Result<Self> {
        let file = match &general.dump_file {
            Some(path) if general.dump => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            _ => None,
        };
        Ok(Self {
            enabled: general.dump,
            file,
        })
    }

    /// True if dumps are produced at all.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Writes `header` followed by a binary dump of `memory`.
    ///
    /// The dump is rendered first and written in one piece, so concurrent emitters do
    /// not interleave lines.
    ///
    /// # Errors
    ///
    /// Fails if stdout or the dump file cannot be written.
    pub fn emit(&self, header: &str, memory: &TlbMemory) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut text = Vec::new();
        writeln!(text, "{header}")?;
        memory.bin_dump(&mut text)?;

        io::stdout().lock().write_all(&text)?;
        if let Some(file) = &self.file {
            file.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(&text)?;
        }
        Ok(())
    }
}
