//! Snapshot file format structures
//!
//! ```text
//! header (48 bytes, little-endian)
//!   magic "RBFP" | version u16 | flags u16 | song_count u32 | next_song_id u32
//!   code_count u32 | reserved u32 | posting_count u64 | payload_size u64
//!   checksum u64 (CRC-64/ECMA-182 of the uncompressed payload)
//! payload (zstd compressed when flag bit 0 is set)
//!   config_len u32 | config JSON
//!   song_count   x (id u32 | name_len u32 | name UTF-8)
//!   code_count   x (code u32 | n u32 | n x (song_id u32 | anchor_time u32))
//! ```

use crc::{Crc, CRC_64_ECMA_182};
use thiserror::Error;

/// Magic bytes for snapshot files: "RBFP"
pub const MAGIC: [u8; 4] = *b"RBFP";

/// Current format version
pub const VERSION: u16 = 1;

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 48;

/// Checksum over the uncompressed payload
pub const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

const FLAG_COMPRESSED: u16 = 0x1;

/// Snapshot read/write errors
#[derive(Debug, Error)]
pub enum FpError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: header {expected:#018x}, payload {actual:#018x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("truncated snapshot: {0}")]
    Truncated(&'static str),

    #[error("song name is not valid UTF-8")]
    InvalidName,

    #[error("compression error: {0}")]
    Compression(String),

    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// File header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes: "RBFP"
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Flags (bit 0: compressed)
    pub flags: u16,
    /// Number of registry entries
    pub song_count: u32,
    /// Next id the registry will assign
    pub next_song_id: u32,
    /// Number of distinct codes
    pub code_count: u32,
    /// Reserved
    pub reserved: u32,
    /// Number of (song, anchor) postings over all codes
    pub posting_count: u64,
    /// Size of the uncompressed payload
    pub payload_size: u64,
    /// CRC-64 of the uncompressed payload
    pub checksum: u64,
}

impl SnapshotHeader {
    pub fn new(song_count: u32, next_song_id: u32, code_count: u32, posting_count: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            song_count,
            next_song_id,
            code_count,
            reserved: 0,
            posting_count,
            payload_size: 0,
            checksum: 0,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & FLAG_COMPRESSED) != 0
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        if compressed {
            self.flags |= FLAG_COMPRESSED;
        } else {
            self.flags &= !FLAG_COMPRESSED;
        }
    }
}

/// Registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSong {
    pub id: u32,
    pub name: String,
}

/// All postings of one code: (song_id, anchor_time)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBucket {
    pub code: u32,
    pub postings: Vec<(u32, u32)>,
}

/// Complete snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub header: SnapshotHeader,
    /// Algorithm configuration the index was built with (JSON)
    pub config_json: String,
    pub songs: Vec<SnapshotSong>,
    pub buckets: Vec<SnapshotBucket>,
}

impl SnapshotFile {
    /// Build a snapshot, deriving the header counts from the content
    pub fn new(
        config_json: String,
        next_song_id: u32,
        songs: Vec<SnapshotSong>,
        buckets: Vec<SnapshotBucket>,
    ) -> Self {
        let posting_count = buckets.iter().map(|b| b.postings.len() as u64).sum();
        let header = SnapshotHeader::new(
            songs.len() as u32,
            next_song_id,
            buckets.len() as u32,
            posting_count,
        );
        Self {
            header,
            config_json,
            songs,
            buckets,
        }
    }
}
