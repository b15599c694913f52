//! rbsearch - Identify a recording against a snapshot
//!
//! Usage: rbsearch [--config <settings.toml>] [--snapshot <path>] <wav>

use anyhow::{Context, Result};
use clap::Parser;
use ringabell_cli::output::print_json_result;
use ringabell_cli::{init_logger, load_settings};
use ringabell_core::{AudioInput, Engine};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rbsearch")]
#[command(about = "Search a WAV recording in a Ringabell snapshot", long_about = None)]
struct Args {
    /// Query WAV file
    query: PathBuf,

    /// Path to settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot path (overrides the settings file)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let snapshot_path = args.snapshot.unwrap_or(settings.snapshot.path);

    // Validate paths
    if !snapshot_path.exists() {
        anyhow::bail!("Snapshot not found: {}", snapshot_path.display());
    }
    if !args.query.exists() {
        anyhow::bail!("Query file not found: {}", args.query.display());
    }

    let load_start = std::time::Instant::now();
    let engine = Engine::load_from_path(&snapshot_path, settings.algorithm)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
    log::info!(
        "Loaded {} songs ({} hashes) in {:.2}s",
        engine.song_count()?,
        engine.hash_count()?,
        load_start.elapsed().as_secs_f64()
    );

    log::info!("Loading query: {}", args.query.display());
    let bytes = std::fs::read(&args.query)
        .with_context(|| format!("Failed to read {}", args.query.display()))?;

    let match_start = std::time::Instant::now();
    let result = engine.search(&AudioInput::Wav(bytes))?;
    log::info!(
        "Matching completed in {:.2}s",
        match_start.elapsed().as_secs_f64()
    );

    print_json_result(&result);

    Ok(())
}
