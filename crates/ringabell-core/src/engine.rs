//! Recognition engine
//!
//! Owns the registry and the fingerprint index behind one lock. The
//! pipeline runs outside the lock so that a long registration never blocks
//! concurrent searches; only the final insert takes the write lock.

use crate::audio::AudioInput;
use crate::cancel::CancelToken;
use crate::config::RingabellConfig;
use crate::error::{EngineError, Result};
use crate::fingerprint::FingerprintHash;
use crate::fingerprint_audio;
use crate::index::FingerprintIndex;
use crate::matching::Matcher;
use crate::registry::{Registry, Song, SongId};
use crate::snapshot;
use ringabell_fp::{SnapshotReader, SnapshotWriter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Result of a search, as handed to the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// `None` when nothing passed the acceptance thresholds
    pub song_name: Option<String>,
    /// Share of query hashes that landed in the winning offset window, in [0, 1]
    pub score: f64,
    pub song_id: Option<SongId>,
    pub aligned_hits: usize,
    pub query_hashes: usize,
    /// Where the query starts inside the matched song
    pub offset_seconds: Option<f64>,
}

impl SearchResult {
    fn not_found(query_hashes: usize) -> Self {
        Self {
            song_name: None,
            score: 0.0,
            song_id: None,
            aligned_hits: 0,
            query_hashes,
            offset_seconds: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.song_name.is_some()
    }

    /// `{"songName": ..., "score": ..., ...}`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

struct EngineState {
    registry: Registry,
    index: FingerprintIndex,
}

/// Audio content recognition engine. Share it as `Arc<Engine>`.
pub struct Engine {
    config: RingabellConfig,
    state: RwLock<EngineState>,
}

impl Engine {
    pub fn new(config: RingabellConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_state(config, Registry::new(), FingerprintIndex::new()))
    }

    fn with_state(config: RingabellConfig, registry: Registry, index: FingerprintIndex) -> Self {
        Self {
            config,
            state: RwLock::new(EngineState { registry, index }),
        }
    }

    pub fn config(&self) -> &RingabellConfig {
        &self.config
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, EngineState>> {
        self.state.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, EngineState>> {
        self.state.write().map_err(|_| EngineError::LockPoisoned)
    }

    /// Fingerprint `audio` and store it under `name`
    pub fn register(&self, name: &str, audio: &AudioInput) -> Result<SongId> {
        self.register_inner(name, audio, None)
    }

    pub fn register_cancellable(
        &self,
        name: &str,
        audio: &AudioInput,
        cancel: &CancelToken,
    ) -> Result<SongId> {
        self.register_inner(name, audio, Some(cancel))
    }

    fn register_inner(
        &self,
        name: &str,
        audio: &AudioInput,
        cancel: Option<&CancelToken>,
    ) -> Result<SongId> {
        check_song_name(name)?;

        // Cheap early rejection; the authoritative check is under the write lock
        self.read_state()?.registry.ensure_available(name)?;

        let hashes = fingerprint_audio(audio, &self.config, cancel)?;
        self.register_fingerprints(name, &hashes)
    }

    /// Store hashes already produced by [`fingerprint_audio`] with this
    /// engine's config.
    ///
    /// Lets a caller fingerprint many files in parallel and still assign ids
    /// in an order of its choosing.
    pub fn register_fingerprints(
        &self,
        name: &str,
        hashes: &[FingerprintHash],
    ) -> Result<SongId> {
        check_song_name(name)?;

        let mut state = self.write_state()?;
        let id = state.registry.insert(name)?;
        state.index.insert(id, hashes);
        drop(state);

        log::info!("Registered '{}' as song {} ({} hashes)", name, id, hashes.len());
        Ok(id)
    }

    /// Identify which registered song `audio` comes from
    pub fn search(&self, audio: &AudioInput) -> Result<SearchResult> {
        self.search_inner(audio, None)
    }

    pub fn search_cancellable(
        &self,
        audio: &AudioInput,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        self.search_inner(audio, Some(cancel))
    }

    fn search_inner(
        &self,
        audio: &AudioInput,
        cancel: Option<&CancelToken>,
    ) -> Result<SearchResult> {
        let hashes = fingerprint_audio(audio, &self.config, cancel)?;

        let state = self.read_state()?;
        let outcome = Matcher::new(&self.config).find_best(&state.index, &hashes);

        let Some(best) = outcome.best else {
            log::info!(
                "No match ({} query hashes, {} candidates)",
                outcome.query_hashes,
                outcome.candidates
            );
            return Ok(SearchResult::not_found(outcome.query_hashes));
        };

        let song = state.registry.get(best.song_id).ok_or_else(|| {
            EngineError::IndexCorruption(format!("posting for unregistered song {}", best.song_id))
        })?;

        let result = SearchResult {
            song_name: Some(song.name.clone()),
            score: outcome.score,
            song_id: Some(song.id),
            aligned_hits: best.aligned_hits,
            query_hashes: outcome.query_hashes,
            offset_seconds: Some(best.offset_frames as f64 * self.config.frame_duration_s()),
        };

        log::info!(
            "Matched '{}' (score {:.3}, {} of {} hashes aligned)",
            song.name,
            result.score,
            result.aligned_hits,
            result.query_hashes
        );
        Ok(result)
    }

    /// Drop a song and all of its hashes
    pub fn remove(&self, name: &str) -> Result<SongId> {
        let mut state = self.write_state()?;
        let song = state
            .registry
            .remove(name)
            .ok_or_else(|| EngineError::UnknownSong(name.to_string()))?;
        let removed = state.index.remove_song(song.id);
        drop(state);

        log::info!("Removed '{}' (song {}, {} hashes)", song.name, song.id, removed);
        Ok(song.id)
    }

    /// Forget every song. Ids handed out before are never reused.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.write_state()?;
        state.registry.clear();
        state.index.reset();
        Ok(())
    }

    pub fn songs(&self) -> Result<Vec<Song>> {
        Ok(self.read_state()?.registry.songs())
    }

    pub fn song_count(&self) -> Result<usize> {
        Ok(self.read_state()?.registry.len())
    }

    /// Total postings across all songs
    pub fn hash_count(&self) -> Result<usize> {
        Ok(self.read_state()?.index.len())
    }

    /// Write the whole engine state. The read lock is held only while collecting it.
    pub fn save_snapshot<W: Write>(&self, writer: &mut W, compress: bool) -> Result<()> {
        let state = self.read_state()?;
        let file = snapshot::to_snapshot(&self.config, &state.registry, &state.index)?;
        drop(state);

        SnapshotWriter::new().compressed(compress).write(writer, &file)?;

        log::info!(
            "Saved snapshot: {} songs, {} codes, {} postings{}",
            file.header.song_count,
            file.header.code_count,
            file.header.posting_count,
            if compress { " (zstd)" } else { "" }
        );
        Ok(())
    }

    /// Rebuild an engine from a snapshot written with the same `config`
    pub fn load_snapshot<R: Read>(reader: &mut R, config: RingabellConfig) -> Result<Self> {
        config.validate()?;

        let file = SnapshotReader::read(reader)?;
        let (song_count, posting_count) = (file.header.song_count, file.header.posting_count);
        let (registry, index) = snapshot::from_snapshot(file, &config)?;

        log::info!("Loaded snapshot: {} songs, {} postings", song_count, posting_count);
        Ok(Self::with_state(config, registry, index))
    }

    pub fn save_to_path(&self, path: &Path, compress: bool) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_snapshot(&mut writer, compress)
    }

    pub fn load_from_path(path: &Path, config: RingabellConfig) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load_snapshot(&mut reader, config)
    }
}

fn check_song_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidSongName(name.to_string()));
    }
    Ok(())
}
