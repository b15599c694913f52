//! Audio input handling
//!
//! Turns the byte buffers handed over by a front end (a WAV container or raw
//! 16-bit PCM) into the canonical mono stream at the configured sample rate.

mod decoder;
mod resample;

pub use decoder::{decode_input, AudioData};
pub use resample::resample_to_target;

use crate::config::RingabellConfig;
use crate::error::{EngineError, Result};

/// Audio handed to `register` or `search`
#[derive(Debug, Clone, PartialEq)]
pub enum AudioInput {
    /// A complete RIFF/WAVE file held in memory
    Wav(Vec<u8>),
    /// Headerless little-endian signed 16-bit interleaved samples
    Pcm16 {
        bytes: Vec<u8>,
        sample_rate: u32,
        channels: u16,
    },
    /// Already decoded interleaved samples in [-1, 1]
    Samples {
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
    },
}

impl AudioInput {
    /// Mono float samples at `sample_rate`
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioInput::Samples {
            samples,
            sample_rate,
            channels: 1,
        }
    }
}

/// Decode, downmix and resample into the canonical stream
pub fn prepare_samples(input: &AudioInput, config: &RingabellConfig) -> Result<Vec<f32>> {
    let audio = decode_input(input)?;
    let mono = audio.to_mono();

    let canonical = resample_to_target(
        &mono,
        audio.sample_rate,
        config.sample_rate,
        config.resample_chunk_size,
    )?;

    if canonical.len() < config.window_size {
        return Err(EngineError::InvalidAudioFormat(format!(
            "{} samples at {} Hz is shorter than one {}-sample analysis window",
            canonical.len(),
            config.sample_rate,
            config.window_size
        )));
    }

    log::debug!(
        "Prepared {:.2}s of audio ({} Hz x {} ch -> {} mono samples @ {} Hz)",
        audio.duration_ms as f64 / 1000.0,
        audio.sample_rate,
        audio.channels,
        canonical.len(),
        config.sample_rate
    );

    Ok(canonical)
}
