//! Audio resampling using a fixed-ratio FFT resampler

use crate::error::{EngineError, Result};
use rubato::{FftFixedInOut, Resampler};

/// Resample mono audio to the target sample rate.
///
/// The final chunk is zero padded and the output is truncated to
/// `ceil(len * to / from)` samples, so the same input always produces the
/// same output.
pub fn resample_to_target(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
    chunk_size: usize,
) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, chunk_size, 1).map_err(
            |e| {
                EngineError::InvalidAudioFormat(format!(
                    "cannot resample {} Hz -> {} Hz: {}",
                    from_rate, to_rate, e
                ))
            },
        )?;

    let expected_len = (samples.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let mut output = Vec::with_capacity(expected_len + chunk_size);

    let mut pos = 0;
    while pos < samples.len() || output.len() < expected_len {
        let frames = resampler.input_frames_next();
        let end = (pos + frames).min(samples.len());

        let mut chunk = samples[pos..end].to_vec();
        chunk.resize(frames, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| EngineError::InvalidAudioFormat(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);

        pos = end;
    }

    output.truncate(expected_len);
    Ok(output)
}
