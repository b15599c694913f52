//! Configuration parameters for the recognition pipeline
//!
//! Registration and search must run with identical values; a snapshot
//! records the config it was built with and refuses to load under another.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingabellConfig {
    // Audio processing
    pub sample_rate: u32,
    pub resample_chunk_size: usize,

    // Spectral transform
    pub window_size: usize,
    pub hop_size: usize,
    pub max_bin: usize,
    pub cancel_batch_frames: usize,

    // Landmark extraction
    pub peak_freq_radius: usize,
    pub peak_time_radius: usize,
    pub peak_floor_factor: f32,
    pub max_landmarks_per_frame: usize,

    // Fingerprint generation
    pub fan_out: usize,
    pub min_time_delta: u32,
    pub max_time_delta: u32,
    pub max_freq_delta: u16,

    // Matching
    pub offset_tolerance: u32,
    pub min_aligned_hits: usize,
    pub min_score: f64,
}

impl Default for RingabellConfig {
    fn default() -> Self {
        Self {
            // Audio processing
            sample_rate: 11025,
            resample_chunk_size: 1024,

            // Spectral transform: 93 ms window, 46 ms hop
            window_size: 1024,
            hop_size: 512,
            max_bin: 512,
            cancel_batch_frames: 256,

            // Landmark extraction: 21 bins x 7 frames neighbourhood
            peak_freq_radius: 10,
            peak_time_radius: 3,
            peak_floor_factor: 3.0,
            max_landmarks_per_frame: 5,

            // Fingerprint generation
            fan_out: 5,
            min_time_delta: 1,
            max_time_delta: 63,
            max_freq_delta: 255,

            // Matching
            offset_tolerance: 1,
            min_aligned_hits: 10,
            min_score: 0.05,
        }
    }
}

impl RingabellConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be > 0"));
        }
        if self.resample_chunk_size == 0 {
            return Err(invalid("resample_chunk_size must be > 0"));
        }
        if !self.window_size.is_power_of_two() || self.window_size < 16 {
            return Err(invalid("window_size must be a power of two >= 16"));
        }
        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(invalid("hop_size must be in 1..=window_size"));
        }
        if self.max_bin == 0 || self.max_bin > self.window_size / 2 {
            return Err(invalid("max_bin must be in 1..=window_size/2"));
        }
        // Bins are packed into 9 bits of the hash code.
        if self.max_bin > 512 {
            return Err(invalid("max_bin must be <= 512"));
        }
        if self.cancel_batch_frames == 0 {
            return Err(invalid("cancel_batch_frames must be > 0"));
        }
        if self.max_landmarks_per_frame == 0 || self.fan_out == 0 {
            return Err(invalid("max_landmarks_per_frame and fan_out must be > 0"));
        }
        if !self.peak_floor_factor.is_finite() || self.peak_floor_factor < 0.0 {
            return Err(invalid("peak_floor_factor must be a finite value >= 0"));
        }
        if self.min_time_delta > self.max_time_delta {
            return Err(invalid("min_time_delta must be <= max_time_delta"));
        }
        // Time deltas are packed into 14 bits.
        if self.max_time_delta > 0x3FFF {
            return Err(invalid("max_time_delta must fit in 14 bits"));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(invalid("min_score must be within [0, 1]"));
        }
        Ok(())
    }

    /// Duration of one hop in seconds
    pub fn frame_duration_s(&self) -> f64 {
        self.hop_size as f64 / self.sample_rate as f64
    }
}

fn invalid(msg: &str) -> EngineError {
    EngineError::InvalidConfig(msg.to_string())
}
