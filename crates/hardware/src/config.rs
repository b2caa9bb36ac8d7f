//! Configuration system for the TLB simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline sizes for the TLB device and main memory.
//! 2. **Structures:** Hierarchical config for general options, the TLB and main memory.
//! 3. **Loading:** JSON parsing with per-field defaults and validation.
//!
//! Configuration is supplied as JSON (`--config` on the CLI) or use `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::constants::{DEFAULT_RAM_SIZE, DEFAULT_TLB_SIZE, MAX_PAGE_NUMBER};
use crate::common::{ConfigError, PAGE_SIZE, SET_SIZE};

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use tlbsim_core::config::Config;
///
/// let config = Config::default();
/// assert!(!config.general.dump);
/// assert_eq!(config.tlb.size_bytes, 512);
/// ```
///
/// Deserializing from JSON; missing fields take their defaults:
///
/// ```
/// use tlbsim_core::config::Config;
///
/// let json = r#"{
///     "general": { "dump": true },
///     "tlb": { "size_bytes": 64 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.dump);
/// assert_eq!(config.tlb.num_sets(), 4);
/// assert_eq!(config.memory.ram_size, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// TLB device geometry
    #[serde(default)]
    pub tlb: TlbConfig,
    /// Main memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed JSON, or a validation error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Checks that the TLB holds at least one set and RAM at least one page.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TlbTooSmall`] or [`ConfigError::RamTooSmall`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tlb.size_bytes < SET_SIZE {
            return Err(ConfigError::TlbTooSmall(self.tlb.size_bytes));
        }
        if self.memory.ram_size < PAGE_SIZE as usize {
            return Err(ConfigError::RamTooSmall(self.memory.ram_size));
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Dump the TLB device after every allocation, free and access.
    #[serde(default)]
    pub dump: bool,

    /// Also append dumps to this file.
    #[serde(default)]
    pub dump_file: Option<PathBuf>,
}

/// TLB device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlbConfig {
    /// Device capacity in bytes; every 16 bytes form one two-way set.
    #[serde(default = "TlbConfig::default_size")]
    pub size_bytes: usize,
}

impl TlbConfig {
    /// Returns the default device capacity.
    const fn default_size() -> usize {
        DEFAULT_TLB_SIZE
    }

    /// Number of sets the configured device holds.
    pub const fn num_sets(&self) -> usize {
        self.size_bytes / SET_SIZE
    }
}

impl Default for TlbConfig {
    fn default() -> Self {
        Self {
            size_bytes: Self::default_size(),
        }
    }
}

/// Main memory configuration for the paged memory manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Main RAM size in bytes.
    #[serde(default = "MemoryConfig::default_ram_size")]
    pub ram_size: usize,

    /// Virtual pages per process.
    #[serde(default = "MemoryConfig::default_max_pages")]
    pub max_pages: u32,
}

impl MemoryConfig {
    const fn default_ram_size() -> usize {
        DEFAULT_RAM_SIZE
    }

    const fn default_max_pages() -> u32 {
        MAX_PAGE_NUMBER
    }
}

impl Default for MemoryConfig {
    /// Returns the default memory configuration.
    ///
    /// 1 MiB of RAM and the full 14-bit virtual page space.
    fn default() -> Self {
        Self {
            ram_size: Self::default_ram_size(),
            max_pages: Self::default_max_pages(),
        }
    }
}
