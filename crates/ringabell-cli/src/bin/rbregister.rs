//! rbregister - Register songs into a snapshot
//!
//! Usage: rbregister [--config <settings.toml>] [--snapshot <path>] <wav>...

use anyhow::{Context, Result};
use clap::Parser;
use ringabell_cli::output::{print_register_summary, FailedFile, RegisterSummary, RegisteredFile};
use ringabell_cli::{init_logger, load_settings, register_files};
use ringabell_core::Engine;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rbregister")]
#[command(about = "Register WAV files into a Ringabell snapshot", long_about = None)]
struct Args {
    /// WAV files to register; each song is named after its file name
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot path (overrides the settings file)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Compress the snapshot with zstd
    #[arg(long)]
    compress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let snapshot_path = args.snapshot.unwrap_or(settings.snapshot.path);
    let compress = args.compress || settings.snapshot.compress;

    let engine = if snapshot_path.exists() {
        log::info!("Loading snapshot: {}", snapshot_path.display());
        Engine::load_from_path(&snapshot_path, settings.algorithm)
            .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?
    } else {
        log::info!("Starting new snapshot: {}", snapshot_path.display());
        Engine::new(settings.algorithm)?
    };

    let start = std::time::Instant::now();
    let mut summary = RegisterSummary::new(&snapshot_path);

    let outcomes = register_files(&engine, &args.files);

    for (file, outcome) in outcomes {
        match outcome {
            Ok(song_id) => summary.registered.push(RegisteredFile { file, song_id }),
            Err(e) => {
                log::warn!("Failed to register {}: {:#}", file, e);
                summary.failed.push(FailedFile {
                    file,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    if !summary.registered.is_empty() {
        engine
            .save_to_path(&snapshot_path, compress)
            .with_context(|| format!("Failed to save snapshot {}", snapshot_path.display()))?;
    }

    summary.total_songs = engine.song_count()?;
    summary.total_hashes = engine.hash_count()?;
    summary.processing_time_seconds = start.elapsed().as_secs_f64();
    summary.sort();

    log::info!(
        "Registered {} files in {:.2}s ({} songs, {} hashes in snapshot)",
        summary.registered.len(),
        summary.processing_time_seconds,
        summary.total_songs,
        summary.total_hashes
    );

    print_register_summary(&summary);

    Ok(())
}
