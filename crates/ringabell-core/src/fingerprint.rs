//! Fingerprint generation and hashing
//!
//! Each landmark acts as an anchor and is paired with up to `fan_out`
//! later landmarks inside its target zone. A pair hashes to a 32-bit code
//! built from the two frequency bins and the frame delta between them, so the
//! code does not depend on where in the recording the pair occurs.

use crate::config::RingabellConfig;
use crate::landmark::Landmark;
use serde::{Deserialize, Serialize};

const FREQ_BITS: u32 = 9;
const DELTA_BITS: u32 = 14;
const FREQ_MASK: u32 = (1 << FREQ_BITS) - 1;
const DELTA_MASK: u32 = (1 << DELTA_BITS) - 1;

/// A time-anchored hash code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintHash {
    /// Packed (anchor bin, target bin, frame delta)
    pub code: u32,
    /// Frame index of the anchor landmark
    pub anchor_time: u32,
}

impl FingerprintHash {
    /// Hash an anchor/target pair
    pub fn new(anchor: &Landmark, target: &Landmark) -> Self {
        let dt = target.time_frame - anchor.time_frame;
        Self {
            code: pack_code(anchor.frequency_bin, target.frequency_bin, dt),
            anchor_time: anchor.time_frame,
        }
    }
}

/// Pack 9 bits of anchor bin, 9 bits of target bin and 14 bits of delta.
///
/// Layout: `anchor << 23 | target << 14 | dt`.
pub fn pack_code(anchor_bin: u16, target_bin: u16, dt: u32) -> u32 {
    ((anchor_bin as u32 & FREQ_MASK) << (FREQ_BITS + DELTA_BITS))
        | ((target_bin as u32 & FREQ_MASK) << DELTA_BITS)
        | (dt & DELTA_MASK)
}

/// Inverse of [`pack_code`]
pub fn unpack_code(code: u32) -> (u16, u16, u32) {
    (
        ((code >> (FREQ_BITS + DELTA_BITS)) & FREQ_MASK) as u16,
        ((code >> DELTA_BITS) & FREQ_MASK) as u16,
        code & DELTA_MASK,
    )
}

/// Fingerprint generator
pub struct FingerprintGenerator {
    fan_out: usize,
    min_time_delta: u32,
    max_time_delta: u32,
    max_freq_delta: u16,
}

impl FingerprintGenerator {
    pub fn new(config: &RingabellConfig) -> Self {
        Self {
            fan_out: config.fan_out,
            min_time_delta: config.min_time_delta,
            max_time_delta: config.max_time_delta,
            max_freq_delta: config.max_freq_delta,
        }
    }

    /// Generate hashes from landmarks ordered by time
    pub fn generate(&self, landmarks: &[Landmark]) -> Vec<FingerprintHash> {
        let mut hashes = Vec::with_capacity(landmarks.len() * self.fan_out);

        for (i, anchor) in landmarks.iter().enumerate() {
            let mut paired = 0;

            for target in &landmarks[i + 1..] {
                let dt = target.time_frame.saturating_sub(anchor.time_frame);

                if dt > self.max_time_delta {
                    break;
                }
                if dt < self.min_time_delta {
                    continue;
                }
                if anchor.frequency_bin.abs_diff(target.frequency_bin) > self.max_freq_delta {
                    continue;
                }

                hashes.push(FingerprintHash::new(anchor, target));

                paired += 1;
                if paired == self.fan_out {
                    break;
                }
            }
        }

        hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_hash() {
        let anchor = Landmark::new(10, 100, 0.5);
        let target = Landmark::new(20, 120, 0.7);

        let fp = FingerprintHash::new(&anchor, &target);
        assert_eq!(fp.anchor_time, 10);
        assert_eq!(fp.code, (100 << 23) | (120 << 14) | 10);

        // Same landmarks should produce same hash
        let fp2 = FingerprintHash::new(&anchor, &target);
        assert_eq!(fp, fp2);
    }

    #[test]
    fn test_code_is_offset_invariant() {
        let a = FingerprintHash::new(&Landmark::new(5, 200, 1.0), &Landmark::new(9, 260, 1.0));
        let b = FingerprintHash::new(&Landmark::new(505, 200, 3.0), &Landmark::new(509, 260, 0.1));
        assert_eq!(a.code, b.code);
        assert_ne!(a.anchor_time, b.anchor_time);
    }

    #[test]
    fn test_unpack_code() {
        assert_eq!(unpack_code(pack_code(511, 3, 63)), (511, 3, 63));
    }

    #[test]
    fn test_target_zone() {
        let generator = FingerprintGenerator::new(&RingabellConfig::default());
        let landmarks = vec![
            Landmark::new(0, 100, 1.0),
            Landmark::new(0, 150, 1.0), // same frame: dt below min
            Landmark::new(4, 450, 1.0), // too far in frequency from 100
            Landmark::new(8, 120, 1.0),
            Landmark::new(100, 110, 1.0), // beyond max_time_delta
        ];

        let hashes = generator.generate(&landmarks);
        let from_first: Vec<u32> = hashes
            .iter()
            .filter(|h| h.anchor_time == 0)
            .map(|h| h.code)
            .collect();

        assert_eq!(
            from_first,
            vec![
                pack_code(100, 120, 8),
                pack_code(150, 120, 8),
            ]
        );
        // Only (4, 450) -> (8, 120) would qualify from frame 4 but |df| = 330
        assert!(hashes.iter().all(|h| h.anchor_time != 4));
        // The last landmark has no target
        assert!(hashes.iter().all(|h| h.anchor_time != 100));
    }

    #[test]
    fn test_fan_out_limit() {
        let config = RingabellConfig {
            fan_out: 3,
            ..RingabellConfig::default()
        };
        let landmarks: Vec<Landmark> = (0..10).map(|t| Landmark::new(t, 100, 1.0)).collect();
        let hashes = FingerprintGenerator::new(&config).generate(&landmarks);

        assert_eq!(hashes.iter().filter(|h| h.anchor_time == 0).count(), 3);
        assert_eq!(hashes.iter().filter(|h| h.anchor_time == 8).count(), 1);
        assert_eq!(hashes.len(), 3 * 7 + 2 + 1);
    }
}
