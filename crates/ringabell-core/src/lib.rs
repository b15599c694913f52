//! Ringabell Core - Audio Content Recognition Library
//!
//! Registers reference recordings under a name and later recognises them,
//! or a noisy excerpt of them, from raw audio. The pipeline is
//! preprocessing -> STFT -> landmark extraction -> pair hashing, followed by
//! an inverted-index lookup and time-offset histogram voting.

pub mod audio;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod landmark;
pub mod matching;
pub mod registry;
pub mod settings;
mod snapshot;
pub mod transform;

pub use audio::AudioInput;
pub use cancel::CancelToken;
pub use config::RingabellConfig;
pub use engine::{Engine, SearchResult};
pub use error::{EngineError, Result};
pub use fingerprint::{FingerprintGenerator, FingerprintHash};
pub use index::{FingerprintIndex, Posting};
pub use landmark::{Landmark, LandmarkExtractor};
pub use matching::{Candidate, MatchOutcome, Matcher};
pub use registry::{Registry, Song, SongId};
pub use settings::RingabellSettings;

/// Generate fingerprint hashes from audio.
///
/// Registration and search both go through here, so they always share the
/// same constants.
pub fn fingerprint_audio(
    input: &AudioInput,
    config: &RingabellConfig,
    cancel: Option<&CancelToken>,
) -> Result<Vec<FingerprintHash>> {
    // Decode, downmix, resample
    let samples = audio::prepare_samples(input, config)?;

    // Extract spectral representation
    let spectrogram = transform::compute_transform(&samples, config, cancel)?;

    // Extract landmarks
    let landmarks = LandmarkExtractor::new(config).extract(&spectrogram);

    // Pair landmarks into hashes
    let hashes = FingerprintGenerator::new(config).generate(&landmarks);

    log::debug!(
        "Pipeline: {} samples -> {} frames -> {} landmarks -> {} hashes",
        samples.len(),
        spectrogram.num_frames,
        landmarks.len(),
        hashes.len()
    );

    Ok(hashes)
}
