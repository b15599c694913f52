//! JSON output formatting

use ringabell_core::{SearchResult, SongId};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RegisteredFile {
    pub file: String,
    pub song_id: SongId,
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Outcome of one `rbregister` run
#[derive(Debug, Serialize)]
pub struct RegisterSummary {
    pub snapshot: String,
    pub registered: Vec<RegisteredFile>,
    pub failed: Vec<FailedFile>,
    pub total_songs: usize,
    pub total_hashes: usize,
    pub processing_time_seconds: f64,
}

impl RegisterSummary {
    pub fn new(snapshot: &Path) -> Self {
        Self {
            snapshot: snapshot.display().to_string(),
            registered: Vec::new(),
            failed: Vec::new(),
            total_songs: 0,
            total_hashes: 0,
            processing_time_seconds: 0.0,
        }
    }

    /// Registered first, then failures; each sorted by file name
    pub fn sort(&mut self) {
        self.registered.sort_by(|a, b| a.file.cmp(&b.file));
        self.failed.sort_by(|a, b| a.file.cmp(&b.file));
    }
}

/// Print search result as JSON
pub fn print_json_result(result: &SearchResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }
}

/// Print registration summary as JSON
pub fn print_register_summary(summary: &RegisterSummary) {
    if !summary.failed.is_empty() {
        log::info!(
            "{} of {} files failed to register",
            summary.failed.len(),
            summary.failed.len() + summary.registered.len()
        );
    }

    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing summary: {}", e),
    }
}
