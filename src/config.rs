//! Configuration for regionfile
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{RegionError, Result};

/// Main configuration for region files
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every data/index file pair
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 1.rgn          (region payloads)
    ///     ├── 1.rgn.idx      (24-byte index entries)
    ///     └── ...
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Writer Configuration
    // -------------------------------------------------------------------------
    /// When the writer fsyncs its two streams
    pub sync_policy: SyncPolicy,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the buffered readers/writers (in bytes)
    pub buffer_size: usize,
}

/// Writer sync policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// flush + fsync once, when the writer scope ends
    #[default]
    OnClose,

    /// flush + fsync both files after every write (safest, slowest)
    EveryWrite,
}

/// Per-file I/O settings carried by every `RegionFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoOptions {
    pub sync_policy: SyncPolicy,
    pub buffer_size: usize,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            sync_policy: SyncPolicy::OnClose,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Default buffer capacity: 64 KiB
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./regionfile_data"),
            sync_policy: SyncPolicy::OnClose,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no region file can work with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(RegionError::Config(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(RegionError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// The I/O subset handed to each region file
    pub fn io_options(&self) -> IoOptions {
        IoOptions {
            sync_policy: self.sync_policy,
            buffer_size: self.buffer_size,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (parent of all file pairs)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the writer sync policy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Set the buffer capacity (in bytes)
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
