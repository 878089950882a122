//! Error types for regionfile
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::region::RegionId;

/// Result type alias using RegionError
pub type Result<T> = std::result::Result<T, RegionError>;

/// Unified error type for region file operations
#[derive(Debug, Error)]
pub enum RegionError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Malformed index file {}: length {len} is not a multiple of the entry size", .path.display())]
    MalformedIndex { path: PathBuf, len: u64 },

    #[error("Truncated index entry: {len} bytes, need {expected}")]
    TruncatedIndexEntry { len: usize, expected: usize },

    // -------------------------------------------------------------------------
    // Data Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt record for region {region_id} at offset {offset}: {reason}")]
    CorruptRecord {
        region_id: RegionId,
        offset: u64,
        reason: String,
    },

    #[error("Short read for region {region_id} at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        region_id: RegionId,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // API Misuse
    // -------------------------------------------------------------------------
    #[error("Usage error: {0}")]
    Usage(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for RegionError {
    fn from(err: bincode::Error) -> Self {
        RegionError::Serialization(err.to_string())
    }
}
