//! Inverted fingerprint index
//!
//! Maps a hash code to every (song, anchor time) occurrence registered so
//! far. Collisions between songs and within a song are expected and kept.

use crate::fingerprint::FingerprintHash;
use crate::registry::SongId;
use std::collections::HashMap;

/// One occurrence of a code inside a registered recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Posting {
    pub song_id: SongId,
    pub anchor_time: u32,
}

/// Inverted index: code -> postings
#[derive(Debug, Default, Clone)]
pub struct FingerprintIndex {
    postings: HashMap<u32, Vec<Posting>>,
    len: usize,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one posting per hash. Repeated codes are not deduplicated.
    pub fn insert(&mut self, song_id: SongId, hashes: &[FingerprintHash]) {
        for hash in hashes {
            self.postings.entry(hash.code).or_default().push(Posting {
                song_id,
                anchor_time: hash.anchor_time,
            });
        }
        self.len += hashes.len();
    }

    /// All occurrences of `code`, empty if unknown
    pub fn lookup(&self, code: u32) -> &[Posting] {
        self.postings.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop every posting of `song_id`, returning how many were removed
    pub fn remove_song(&mut self, song_id: SongId) -> usize {
        let before = self.len;
        self.postings.retain(|_, list| {
            list.retain(|p| p.song_id != song_id);
            !list.is_empty()
        });
        self.len = self.postings.values().map(Vec::len).sum();
        before - self.len
    }

    pub fn reset(&mut self) {
        self.postings.clear();
        self.len = 0;
    }

    /// Total number of postings
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct codes (the hash-table size)
    pub fn distinct_codes(&self) -> usize {
        self.postings.len()
    }

    /// Codes in ascending order with their postings in insertion order
    pub fn iter_sorted(&self) -> Vec<(u32, &[Posting])> {
        let mut entries: Vec<(u32, &[Posting])> = self
            .postings
            .iter()
            .map(|(&code, list)| (code, list.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|(code, _)| *code);
        entries
    }

    /// Append raw postings under `code` (snapshot replay)
    pub(crate) fn insert_postings(&mut self, code: u32, postings: &[Posting]) {
        self.postings.entry(code).or_default().extend_from_slice(postings);
        self.len += postings.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(code: u32, anchor_time: u32) -> FingerprintHash {
        FingerprintHash { code, anchor_time }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = FingerprintIndex::new();
        index.insert(1, &[hash(7, 0), hash(7, 5), hash(9, 2)]);
        index.insert(2, &[hash(7, 3)]);

        assert_eq!(index.len(), 4);
        assert_eq!(index.distinct_codes(), 2);
        assert_eq!(
            index.lookup(7),
            &[
                Posting { song_id: 1, anchor_time: 0 },
                Posting { song_id: 1, anchor_time: 5 },
                Posting { song_id: 2, anchor_time: 3 },
            ]
        );
        assert!(index.lookup(1234).is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut index = FingerprintIndex::new();
        index.insert(1, &[hash(7, 0), hash(7, 0)]);
        assert_eq!(index.lookup(7).len(), 2);
    }

    #[test]
    fn test_remove_song() {
        let mut index = FingerprintIndex::new();
        index.insert(1, &[hash(7, 0), hash(8, 1)]);
        index.insert(2, &[hash(7, 3)]);

        assert_eq!(index.remove_song(1), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.distinct_codes(), 1);
        assert!(index.lookup(8).is_empty());
        assert_eq!(index.remove_song(42), 0);
    }

    #[test]
    fn test_reset_and_sorted_iteration() {
        let mut index = FingerprintIndex::new();
        index.insert(1, &[hash(30, 0), hash(10, 1), hash(20, 2)]);

        let codes: Vec<u32> = index.iter_sorted().iter().map(|(c, _)| *c).collect();
        assert_eq!(codes, vec![10, 20, 30]);

        index.reset();
        assert!(index.is_empty());
        assert_eq!(index.distinct_codes(), 0);
    }
}
