//! In-memory audio decoding

use super::AudioInput;
use crate::error::{EngineError, Result};
use std::io::Cursor;

/// Decoded audio data
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
}

impl AudioData {
    fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if samples.is_empty() {
            return Err(EngineError::InvalidAudioFormat("audio buffer is empty".into()));
        }
        if sample_rate == 0 || channels == 0 {
            return Err(EngineError::InvalidAudioFormat(format!(
                "unsupported layout: {} Hz, {} channels",
                sample_rate, channels
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(EngineError::InvalidAudioFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(EngineError::InvalidAudioFormat("non-finite sample value".into()));
        }

        let duration_ms =
            (samples.len() as f64 / (sample_rate as f64 * channels as f64) * 1000.0) as u32;

        Ok(Self {
            samples,
            sample_rate,
            channels,
            duration_ms,
        })
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);
        for chunk in self.samples.chunks(self.channels as usize) {
            let avg: f32 = chunk.iter().sum::<f32>() / chunk.len() as f32;
            mono.push(avg);
        }
        mono
    }
}

/// Decode any supported input into interleaved float samples
pub fn decode_input(input: &AudioInput) -> Result<AudioData> {
    match input {
        AudioInput::Wav(bytes) => decode_wav(bytes),
        AudioInput::Pcm16 {
            bytes,
            sample_rate,
            channels,
        } => decode_pcm16(bytes, *sample_rate, *channels),
        AudioInput::Samples {
            samples,
            sample_rate,
            channels,
        } => AudioData::new(samples.clone(), *sample_rate, *channels),
    }
}

/// Decode a WAV container held in memory
fn decode_wav(bytes: &[u8]) -> Result<AudioData> {
    if bytes.is_empty() {
        return Err(EngineError::InvalidAudioFormat("audio buffer is empty".into()));
    }

    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| EngineError::InvalidAudioFormat(format!("unrecognized WAV header: {}", e)))?;

    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(wav_data_error)?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(wav_data_error)?
        }
    };

    AudioData::new(samples, spec.sample_rate, spec.channels)
}

fn wav_data_error(e: hound::Error) -> EngineError {
    EngineError::InvalidAudioFormat(format!("malformed WAV sample data: {}", e))
}

/// Decode headerless 16-bit little-endian PCM
fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioData> {
    if bytes.len() % 2 != 0 {
        return Err(EngineError::InvalidAudioFormat(format!(
            "odd PCM16 byte count {}",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    AudioData::new(samples, sample_rate, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_stereo() {
        let bytes = wav_bytes(&[16384, -16384, 8192, 8192], 22050, 2);
        let audio = decode_input(&AudioInput::Wav(bytes)).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), 4);
        assert!((audio.samples[0] - 0.5).abs() < 1e-6);

        let mono = audio.to_mono();
        assert_eq!(mono.len(), 2);
        assert!(mono[0].abs() < 1e-6);
        assert!((mono[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let err = decode_input(&AudioInput::Wav(Vec::new())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAudioFormat(_)));
    }

    #[test]
    fn test_garbage_header_rejected() {
        let err = decode_input(&AudioInput::Wav(b"definitely not a riff header".to_vec())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAudioFormat(_)));
    }

    #[test]
    fn test_decode_pcm16() {
        let bytes = [0x00, 0x40, 0x00, 0xC0].to_vec();
        let audio = decode_input(&AudioInput::Pcm16 {
            bytes,
            sample_rate: 11025,
            channels: 1,
        })
        .unwrap();
        assert_eq!(audio.samples, vec![0.5, -0.5]);
    }

    #[test]
    fn test_odd_pcm16_rejected() {
        let err = decode_input(&AudioInput::Pcm16 {
            bytes: vec![0, 1, 2],
            sample_rate: 11025,
            channels: 1,
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAudioFormat(_)));
    }

    #[test]
    fn test_channel_mismatch_rejected() {
        let err = decode_input(&AudioInput::Samples {
            samples: vec![0.0; 3],
            sample_rate: 11025,
            channels: 2,
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAudioFormat(_)));
    }
}
