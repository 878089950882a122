//! # regionfile
//!
//! The per-file persistence unit of a region storage engine:
//! - Append-only data file of opaque region records
//! - Fixed-width index file naming each record's region and size
//! - In-memory liveness index of the regions a file still owns
//! - "Larger file ID wins" ownership resolution across files
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Region manager (external)                    │
//! │     picks files, schedules compaction, destroys files        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ add/drop/try_cover/use_rate/destroy/reset_id
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       RegionFile                             │
//! │          file_id · file_size · regions (liveness)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Writer    │          │   Reader    │
//!   │  (Append)   │          │ (Snapshot)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │   {id}.rgn  +  {id}.rgn.idx         │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod region;
pub mod region_file;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RegionError, Result};
pub use config::{Config, SyncPolicy};
pub use region::{RawRegion, Region, RegionId, RegionSnapshot};
pub use region_file::{FilePairState, RegionFile, RegionFileReader, RegionFileWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of regionfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
