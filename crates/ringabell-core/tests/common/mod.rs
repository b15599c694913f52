//! Deterministic synthetic audio for engine tests
//!
//! A "song" is a sequence of short notes. Each note sounds three tones
//! centred exactly on STFT bins, with a fast attack and exponential decay,
//! so every note yields sharp, well separated landmarks.

#![allow(dead_code)]

use ringabell_core::{AudioInput, Engine, RingabellConfig};

pub const RATE: u32 = 11025;
pub const HOP: usize = 512;

const NOTE_SECONDS: f32 = 0.25;
const TONES_PER_NOTE: usize = 3;
const TONE_AMPLITUDE: f32 = 0.2;
const ATTACK_SECONDS: f32 = 0.005;
const DECAY_SECONDS: f32 = 0.08;
const MIN_BIN: u16 = 20;
const MAX_BIN: u16 = 460;
const MIN_BIN_GAP: u16 = 24;

/// 64-bit LCG, good enough for reproducible test material
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed ^ 0x9E37_79B9_7F4A_7C15)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    /// Uniform in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn next_bin(&mut self) -> u16 {
        MIN_BIN + (self.next_u64() >> 33) as u16 % (MAX_BIN - MIN_BIN)
    }
}

/// Bins for each note. Tones keep clear of each other and of the previous note.
pub fn melody(seed: u64, notes: usize) -> Vec<Vec<u16>> {
    let mut rng = Lcg::new(seed);
    let mut melody: Vec<Vec<u16>> = Vec::with_capacity(notes);

    for _ in 0..notes {
        let previous = melody.last().cloned().unwrap_or_default();
        let mut note = Vec::with_capacity(TONES_PER_NOTE);
        while note.len() < TONES_PER_NOTE {
            let bin = rng.next_bin();
            let clear = note
                .iter()
                .chain(previous.iter())
                .all(|&other: &u16| bin.abs_diff(other) >= MIN_BIN_GAP);
            if clear {
                note.push(bin);
            }
        }
        melody.push(note);
    }
    melody
}

/// Render a melody at `sample_rate` with uniform noise of `noise_amplitude`
pub fn render(
    melody: &[Vec<u16>],
    sample_rate: u32,
    noise_seed: u64,
    noise_amplitude: f32,
) -> Vec<f32> {
    let sr = sample_rate as f32;
    let note_len = (NOTE_SECONDS * sr) as usize;
    let mut samples = vec![0.0f32; note_len * melody.len()];

    for (k, note) in melody.iter().enumerate() {
        let start = k * note_len;
        for &bin in note {
            // Same physical frequency whatever the sample rate
            let freq = bin as f32 * RATE as f32 / 1024.0;
            for n in 0..note_len {
                let t = n as f32 / sr;
                let envelope = if t < ATTACK_SECONDS {
                    t / ATTACK_SECONDS
                } else {
                    (-(t - ATTACK_SECONDS) / DECAY_SECONDS).exp()
                };
                samples[start + n] +=
                    TONE_AMPLITUDE * envelope * (2.0 * std::f32::consts::PI * freq * t).sin();
            }
        }
    }

    add_noise(&mut samples, noise_seed, noise_amplitude);
    samples
}

pub fn add_noise(samples: &mut [f32], seed: u64, amplitude: f32) {
    let mut rng = Lcg::new(seed);
    for s in samples.iter_mut() {
        *s += amplitude * (2.0 * rng.next_f32() - 1.0);
    }
}

/// Eight seconds of material at the canonical rate
pub fn song(seed: u64) -> Vec<f32> {
    render(&melody(seed, 32), RATE, seed.wrapping_add(1000), 0.1)
}

pub fn mono(samples: Vec<f32>) -> AudioInput {
    AudioInput::mono(samples, RATE)
}

/// Engine with one `song-<seed>.wav` per seed, registered in order
pub fn engine_with_songs(seeds: &[u64]) -> Engine {
    let engine = Engine::new(RingabellConfig::default()).unwrap();
    for &seed in seeds {
        engine
            .register(&format!("song-{}.wav", seed), &mono(song(seed)))
            .unwrap();
    }
    engine
}

/// Interleaved 16-bit WAV file in memory
pub fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
