//! Engine error type

use ringabell_fp::FpError;
use thiserror::Error;

/// Errors surfaced by the recognition engine.
///
/// A search that finds nothing is not an error; it yields a
/// [`SearchResult`](crate::SearchResult) with a zero score.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty buffer, unparseable header, or fewer samples than one analysis window.
    #[error("invalid audio format: {0}")]
    InvalidAudioFormat(String),

    /// A song with this name is already registered.
    #[error("duplicate song name: {0}")]
    DuplicateSongName(String),

    /// Song names must contain at least one non-whitespace character.
    #[error("invalid song name: {0:?}")]
    InvalidSongName(String),

    /// No song with this name is registered.
    #[error("unknown song: {0}")]
    UnknownSong(String),

    /// A persisted snapshot failed validation. Nothing was loaded.
    #[error("index corruption: {0}")]
    IndexCorruption(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The caller's cancel token fired between two frame batches.
    #[error("operation cancelled")]
    Cancelled,

    #[error("engine state lock poisoned")]
    LockPoisoned,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FpError> for EngineError {
    fn from(err: FpError) -> Self {
        match err {
            FpError::Io(e) => EngineError::Io(e),
            other => EngineError::IndexCorruption(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
