//! Short-time Fourier transform
//!
//! Splits the canonical stream into overlapping Hann-windowed frames and keeps
//! the magnitude of the lower `max_bin` FFT bins of each frame.

use crate::cancel::CancelToken;
use crate::config::RingabellConfig;
use crate::error::{EngineError, Result};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Spectrogram representation
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude values [time_frame][frequency_bin]
    pub magnitudes: Vec<Vec<f32>>,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins
    pub num_bins: usize,
    /// Seconds between consecutive frames
    pub frame_duration_s: f64,
}

impl Spectrogram {
    /// Mean magnitude over the whole grid
    pub fn mean_magnitude(&self) -> f32 {
        let cells = self.num_frames * self.num_bins;
        if cells == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .magnitudes
            .iter()
            .flat_map(|frame| frame.iter())
            .map(|&m| m as f64)
            .sum();
        (sum / cells as f64) as f32
    }
}

/// Compute the magnitude spectrogram.
///
/// Frames inside a batch of `cancel_batch_frames` are transformed in parallel;
/// `cancel` is polled before every batch.
pub fn compute_transform(
    samples: &[f32],
    config: &RingabellConfig,
    cancel: Option<&CancelToken>,
) -> Result<Spectrogram> {
    let window_size = config.window_size;
    let hop_size = config.hop_size;

    if samples.len() < window_size {
        return Err(EngineError::InvalidAudioFormat(format!(
            "{} samples is shorter than one analysis window",
            samples.len()
        )));
    }

    // Only full frames
    let num_frames = 1 + (samples.len() - window_size) / hop_size;
    let num_bins = config.max_bin.min(window_size / 2);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(window_size);

    let window = create_hann_window(window_size);

    let mut magnitudes = Vec::with_capacity(num_frames);

    for batch_start in (0..num_frames).step_by(config.cancel_batch_frames) {
        if let Some(token) = cancel {
            token.check()?;
        }

        let batch_end = (batch_start + config.cancel_batch_frames).min(num_frames);

        let batch: Vec<Vec<f32>> = (batch_start..batch_end)
            .into_par_iter()
            .map(|frame_idx| {
                let start = frame_idx * hop_size;

                let mut frame: Vec<Complex<f32>> = samples[start..start + window_size]
                    .iter()
                    .zip(&window)
                    .map(|(&s, &w)| Complex::new(s * w, 0.0))
                    .collect();

                fft.process(&mut frame);

                frame[..num_bins].iter().map(|c| c.norm()).collect()
            })
            .collect();

        magnitudes.extend(batch);
    }

    Ok(Spectrogram {
        magnitudes,
        num_frames,
        num_bins,
        frame_duration_s: config.frame_duration_s(),
    })
}

/// Create Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = i as f32 / (size - 1) as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}
