//! Matching by time-offset histogram voting
//!
//! Every query hash found in the index votes for
//! `db_anchor_time - query_anchor_time` in the histogram of the posting's
//! song. A true match piles its votes onto one offset; chance collisions
//! spread out. The song with the tallest (tolerance-widened) bucket wins.

use crate::config::RingabellConfig;
use crate::fingerprint::FingerprintHash;
use crate::index::FingerprintIndex;
use crate::registry::SongId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;


/// Best alignment of the query against one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub song_id: SongId,
    /// Votes inside the winning offset window
    pub aligned_hits: usize,
    /// Votes for this song over all offsets
    pub total_matches: usize,
    /// Centre of the winning window, in frames (reference minus query)
    pub offset_frames: i64,
}

/// Outcome of one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// Accepted winner, `None` when nothing passed the thresholds
    pub best: Option<Candidate>,
    /// `aligned_hits / query_hashes` clamped to 1, or 0 when not found
    pub score: f64,
    pub query_hashes: usize,
    /// Number of songs that received at least one vote
    pub candidates: usize,
}

impl MatchOutcome {
    fn not_found(query_hashes: usize, candidates: usize) -> Self {
        Self {
            best: None,
            score: 0.0,
            query_hashes,
            candidates,
        }
    }
}

/// Histogram-voting matcher
pub struct Matcher {
    offset_tolerance: i64,
    min_aligned_hits: usize,
    min_score: f64,
}

impl Matcher {
    pub fn new(config: &RingabellConfig) -> Self {
        Self {
            offset_tolerance: config.offset_tolerance as i64,
            min_aligned_hits: config.min_aligned_hits,
            min_score: config.min_score,
        }
    }

    /// Find the best aligned song for the query hashes
    pub fn find_best(&self, index: &FingerprintIndex, query: &[FingerprintHash]) -> MatchOutcome {
        if query.is_empty() {
            return MatchOutcome::not_found(0, 0);
        }

        // song -> offset -> votes
        let mut histograms: HashMap<SongId, HashMap<i64, usize>> = HashMap::new();

        for hash in query {
            for posting in index.lookup(hash.code) {
                let offset = posting.anchor_time as i64 - hash.anchor_time as i64;
                *histograms
                    .entry(posting.song_id)
                    .or_default()
                    .entry(offset)
                    .or_insert(0) += 1;
            }
        }

        let candidates: Vec<Candidate> = histograms
            .iter()
            .map(|(&song_id, histogram)| self.best_alignment(song_id, histogram))
            .collect();

        let Some(best) = candidates.iter().max_by(|a, b| rank(a, b)).cloned() else {
            log::debug!("No candidates for {} query hashes", query.len());
            return MatchOutcome::not_found(query.len(), 0);
        };

        let score = (best.aligned_hits as f64 / query.len() as f64).min(1.0);

        if best.aligned_hits < self.min_aligned_hits || score < self.min_score {
            log::trace!(
                "Rejecting song {}: {} aligned hits (need {}), score {:.3} (need {:.3})",
                best.song_id,
                best.aligned_hits,
                self.min_aligned_hits,
                score,
                self.min_score
            );
            return MatchOutcome::not_found(query.len(), candidates.len());
        }

        log::debug!(
            "Best song {}: aligned {}, total {}, offset {} frames, score {:.3} ({} candidates)",
            best.song_id,
            best.aligned_hits,
            best.total_matches,
            best.offset_frames,
            score,
            candidates.len()
        );

        MatchOutcome {
            best: Some(best),
            score,
            query_hashes: query.len(),
            candidates: candidates.len(),
        }
    }

    /// Tallest window of width `2 * tolerance + 1` frames in one histogram
    fn best_alignment(&self, song_id: SongId, histogram: &HashMap<i64, usize>) -> Candidate {
        let mut offsets: Vec<(i64, usize)> = histogram.iter().map(|(&o, &c)| (o, c)).collect();
        offsets.sort_unstable_by_key(|(offset, _)| *offset);

        let total_matches = offsets.iter().map(|(_, count)| count).sum();

        let mut best_offset = 0;
        let mut best_count = 0;
        let mut lo = 0;
        let mut hi = 0;
        let mut window = 0;

        // Window centred on each observed offset, ascending so ties keep the smallest
        for &(center, _) in &offsets {
            while hi < offsets.len() && offsets[hi].0 <= center + self.offset_tolerance {
                window += offsets[hi].1;
                hi += 1;
            }
            while offsets[lo].0 < center - self.offset_tolerance {
                window -= offsets[lo].1;
                lo += 1;
            }
            if window > best_count {
                best_count = window;
                best_offset = center;
            }
        }

        Candidate {
            song_id,
            aligned_hits: best_count,
            total_matches,
            offset_frames: best_offset,
        }
    }
}

/// Higher aligned hits, then higher total matches, then lower song id
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.aligned_hits
        .cmp(&b.aligned_hits)
        .then(a.total_matches.cmp(&b.total_matches))
        .then(b.song_id.cmp(&a.song_id))
}
