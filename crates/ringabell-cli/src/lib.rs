//! Shared pieces of the `rbregister` and `rbsearch` binaries

pub mod output;

use anyhow::{Context, Result};
use rayon::prelude::*;
use ringabell_core::{
    fingerprint_audio, AudioInput, Engine, FingerprintHash, RingabellSettings, SongId,
};
use std::path::{Path, PathBuf};

/// Logging is off unless `verbose`, so stdout carries only the JSON record
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Settings from `path`, or defaults when no file is given
pub fn load_settings(path: Option<&Path>) -> Result<RingabellSettings> {
    match path {
        Some(path) => {
            let settings = RingabellSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            log::info!("Loaded settings from: {}", path.display());
            Ok(settings)
        }
        None => Ok(RingabellSettings::default()),
    }
}

/// Register WAV files, each named after its file name.
///
/// Fingerprinting runs in parallel; ids are assigned in the order of
/// `files`, so the same list always yields the same snapshot.
pub fn register_files(engine: &Engine, files: &[PathBuf]) -> Vec<(String, Result<SongId>)> {
    let fingerprinted: Vec<(String, Result<(String, Vec<FingerprintHash>)>)> = files
        .par_iter()
        .map(|path| (path.display().to_string(), fingerprint_file(engine, path)))
        .collect();

    fingerprinted
        .into_iter()
        .map(|(file, outcome)| {
            let song_id = outcome.and_then(|(name, hashes)| {
                Ok(engine.register_fingerprints(&name, &hashes)?)
            });
            (file, song_id)
        })
        .collect()
}

fn fingerprint_file(engine: &Engine, path: &Path) -> Result<(String, Vec<FingerprintHash>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("No file name in {}", path.display()))?;

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    log::info!("Processing: {} ({} bytes)", path.display(), bytes.len());

    let hashes = fingerprint_audio(&AudioInput::Wav(bytes), engine.config(), None)?;
    Ok((name, hashes))
}
