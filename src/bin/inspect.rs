//! regionfile Inspection Binary
//!
//! Offline view of region file pairs: list pairs in a directory, dump an
//! index, check that a data file matches its index.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use regionfile::region_file::{scan_dir, FilePairState};
use regionfile::{RawRegion, RegionFile};
use tracing_subscriber::{fmt, EnvFilter};

/// regionfile inspector
#[derive(Parser, Debug)]
#[command(name = "regionfile-inspect")]
#[command(about = "Inspect region data/index file pairs")]
#[command(version)]
struct Args {
    /// Directory holding the region files
    #[arg(short, long, default_value = "./regionfile_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List file IDs, flagging unpaired files
    Scan,

    /// Print every index entry of one file
    Dump {
        /// File ID to dump
        #[arg(short, long)]
        file_id: u64,
    },

    /// Read every record and compare sizes against the data file
    Verify {
        /// File ID to verify
        #[arg(short, long)]
        file_id: u64,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,regionfile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("regionfile-inspect v{}", regionfile::VERSION);
    tracing::info!("Data directory: {}", args.data_dir.display());

    if let Err(e) = run(&args) {
        tracing::error!("Inspection failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> regionfile::Result<()> {
    match args.command {
        Command::Scan => {
            let scan = scan_dir(&args.data_dir)?;
            for id in &scan.complete {
                println!("{:>12}  complete", id);
            }
            for id in &scan.data_only {
                println!("{:>12}  data only", id);
            }
            for id in &scan.index_only {
                println!("{:>12}  index only", id);
            }
            if !scan.is_consistent() {
                tracing::warn!("directory holds unpaired region files");
            }
        }
        Command::Dump { file_id } => {
            let file = RegionFile::open_existing(file_id, &args.data_dir)?;
            let reader = file.reader()?;

            let mut offset = 0u64;
            println!("{:>6}  {:>20}  {:>12}  {:>12}", "#", "region_id", "offset", "size");
            for (i, meta) in reader.metas().iter().enumerate() {
                println!(
                    "{:>6}  {:>20}  {:>12}  {:>12}",
                    i, meta.region_id, offset, meta.region_size
                );
                offset = match offset.checked_add(meta.region_size) {
                    Some(next) => next,
                    None => {
                        tracing::error!(
                            entry = i,
                            region_id = meta.region_id,
                            region_size = meta.region_size,
                            "indexed offsets overflow u64, index is corrupt"
                        );
                        std::process::exit(2);
                    }
                };
            }
            println!(
                "file_size={} live_regions={} use_rate={:.4}",
                file.file_size(),
                file.region_count(),
                file.use_rate()
            );
        }
        Command::Verify { file_id } => {
            let file = RegionFile::open_existing(file_id, &args.data_dir)?;
            if file.pair_state() != FilePairState::Complete {
                println!("pair state: {:?}", file.pair_state());
                std::process::exit(2);
            }

            let reader = file.reader()?;
            let Some(indexed) = reader.indexed_bytes() else {
                tracing::error!("indexed region sizes overflow u64, index is corrupt");
                std::process::exit(2);
            };

            let mut records = 0usize;
            for region in reader.into_regions::<RawRegion>() {
                region?;
                records += 1;
            }

            println!(
                "records={} indexed_bytes={} data_bytes={}",
                records,
                indexed,
                file.file_size()
            );
            if indexed != file.file_size() {
                tracing::warn!(
                    trailing = file.file_size().saturating_sub(indexed),
                    "data file length differs from indexed bytes"
                );
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
