//! Landmark extraction using 2D max filtering
//!
//! A landmark is a spectrogram cell that is the maximum of its
//! time x frequency neighbourhood and stands clear of the global mean.

use crate::config::RingabellConfig;
use crate::transform::Spectrogram;
use serde::{Deserialize, Serialize};

/// A local maximum in the spectrogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Time index (frame number)
    pub time_frame: u32,
    /// Frequency bin index
    pub frequency_bin: u16,
    /// Magnitude value
    pub magnitude: f32,
}

impl Landmark {
    pub fn new(time_frame: u32, frequency_bin: u16, magnitude: f32) -> Self {
        Self {
            time_frame,
            frequency_bin,
            magnitude,
        }
    }
}

/// Landmark extractor
pub struct LandmarkExtractor {
    freq_radius: usize,
    time_radius: usize,
    floor_factor: f32,
    max_per_frame: usize,
}

impl LandmarkExtractor {
    pub fn new(config: &RingabellConfig) -> Self {
        Self {
            freq_radius: config.peak_freq_radius,
            time_radius: config.peak_time_radius,
            floor_factor: config.peak_floor_factor,
            max_per_frame: config.max_landmarks_per_frame,
        }
    }

    /// Extract landmarks ordered by (time_frame, frequency_bin)
    pub fn extract(&self, spectrogram: &Spectrogram) -> Vec<Landmark> {
        if spectrogram.num_frames == 0 || spectrogram.num_bins == 0 {
            return Vec::new();
        }

        let max_filtered = self.apply_2d_max_filter(spectrogram);
        let floor = spectrogram.mean_magnitude() * self.floor_factor;

        let mut landmarks = Vec::new();

        for t in 0..spectrogram.num_frames {
            let mut frame_peaks = Vec::new();

            for f in 0..spectrogram.num_bins {
                let m = spectrogram.magnitudes[t][f];

                if m <= 0.0 || m <= floor || m < max_filtered[t][f] {
                    continue;
                }
                if self.has_earlier_tie(spectrogram, &max_filtered, t, f) {
                    continue;
                }

                frame_peaks.push(Landmark::new(t as u32, f as u16, m));
            }

            if frame_peaks.len() > self.max_per_frame {
                // Keep the strongest, then restore bin order
                frame_peaks.sort_by(|a, b| {
                    b.magnitude
                        .total_cmp(&a.magnitude)
                        .then(a.frequency_bin.cmp(&b.frequency_bin))
                });
                frame_peaks.truncate(self.max_per_frame);
                frame_peaks.sort_by_key(|l| l.frequency_bin);
            }

            landmarks.extend(frame_peaks);
        }

        log::debug!(
            "Extracted {} landmarks from {} frames (floor {:.4})",
            landmarks.len(),
            spectrogram.num_frames,
            floor
        );

        landmarks
    }

    /// Apply 2D max filter (frequency then time)
    fn apply_2d_max_filter(&self, spectrogram: &Spectrogram) -> Vec<Vec<f32>> {
        let num_frames = spectrogram.num_frames;
        let num_bins = spectrogram.num_bins;

        // First, filter in frequency dimension
        let mut freq_filtered = vec![vec![0.0; num_bins]; num_frames];

        for t in 0..num_frames {
            for f in 0..num_bins {
                let (f_start, f_end) = neighbourhood(f, self.freq_radius, num_bins);

                freq_filtered[t][f] = spectrogram.magnitudes[t][f_start..f_end]
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
            }
        }

        // Then, filter in time dimension
        let mut time_filtered = vec![vec![0.0; num_bins]; num_frames];

        for t in 0..num_frames {
            let (t_start, t_end) = neighbourhood(t, self.time_radius, num_frames);

            for f in 0..num_bins {
                time_filtered[t][f] = (t_start..t_end)
                    .map(|ti| freq_filtered[ti][f])
                    .fold(f32::NEG_INFINITY, f32::max);
            }
        }

        time_filtered
    }

    /// An equal-valued local maximum earlier in (time, bin) order inside the
    /// same neighbourhood wins; this keeps plateaus down to one landmark.
    fn has_earlier_tie(
        &self,
        spectrogram: &Spectrogram,
        max_filtered: &[Vec<f32>],
        t: usize,
        f: usize,
    ) -> bool {
        let m = spectrogram.magnitudes[t][f];
        let (t_start, _) = neighbourhood(t, self.time_radius, spectrogram.num_frames);
        let (f_start, f_end) = neighbourhood(f, self.freq_radius, spectrogram.num_bins);

        for ti in t_start..=t {
            let f_stop = if ti == t { f } else { f_end };
            for fi in f_start..f_stop {
                if spectrogram.magnitudes[ti][fi] == m && max_filtered[ti][fi] == m {
                    return true;
                }
            }
        }
        false
    }
}

/// Half-open index range `[center - radius, center + radius]` clipped to `len`
fn neighbourhood(center: usize, radius: usize, len: usize) -> (usize, usize) {
    (center.saturating_sub(radius), (center + radius + 1).min(len))
}
