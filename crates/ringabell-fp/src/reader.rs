//! Snapshot reader
//!
//! Everything is validated before a [`SnapshotFile`] is returned: magic,
//! version, checksum, declared counts and UTF-8 names. A snapshot is either
//! loaded whole or rejected.

use crate::format::{
    FpError, SnapshotBucket, SnapshotFile, SnapshotHeader, SnapshotSong, CRC64, HEADER_SIZE, MAGIC,
    VERSION,
};
use std::io::{ErrorKind, Read};

/// Upper bound on the buffer reserved up front from the header's size field
const MAX_PREALLOC: usize = 16 << 20;

pub struct SnapshotReader;

impl SnapshotReader {
    /// Read one snapshot from `reader`. At most the declared payload size is decoded.
    pub fn read<R: Read>(reader: &mut R) -> Result<SnapshotFile, FpError> {
        let header = Self::read_header(reader)?;

        // Validate magic
        if header.magic != MAGIC {
            return Err(FpError::BadMagic);
        }
        if header.version != VERSION {
            return Err(FpError::UnsupportedVersion(header.version));
        }

        // Never read or inflate past the declared size; one extra byte detects overruns
        let limit = header.payload_size.saturating_add(1);
        let mut payload = Vec::with_capacity((header.payload_size as usize).min(MAX_PREALLOC));

        if header.is_compressed() {
            let decoder = zstd::stream::read::Decoder::new(reader.by_ref())
                .map_err(|e| FpError::Compression(e.to_string()))?;
            decoder
                .take(limit)
                .read_to_end(&mut payload)
                .map_err(|e| FpError::Compression(e.to_string()))?;
        } else {
            reader.by_ref().take(limit).read_to_end(&mut payload)?;
        }

        if payload.len() as u64 != header.payload_size {
            return Err(FpError::Truncated("payload size differs from header"));
        }

        let actual = CRC64.checksum(&payload);
        if actual != header.checksum {
            return Err(FpError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        Self::decode_payload(header, &payload)
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<SnapshotHeader, FpError> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => FpError::Truncated("header"),
            _ => FpError::Io(e),
        })?;

        let mut cursor = Cursor::new(&buf);
        let mut magic = [0u8; 4];
        magic.copy_from_slice(cursor.take(4, "magic")?);

        Ok(SnapshotHeader {
            magic,
            version: cursor.u16()?,
            flags: cursor.u16()?,
            song_count: cursor.u32()?,
            next_song_id: cursor.u32()?,
            code_count: cursor.u32()?,
            reserved: cursor.u32()?,
            posting_count: cursor.u64()?,
            payload_size: cursor.u64()?,
            checksum: cursor.u64()?,
        })
    }

    fn decode_payload(header: SnapshotHeader, payload: &[u8]) -> Result<SnapshotFile, FpError> {
        let mut cursor = Cursor::new(payload);

        let config_json = cursor.string()?;

        // Counts come from the file; never trust them for allocation
        let mut songs = Vec::with_capacity((header.song_count as usize).min(cursor.remaining() / 8));
        for _ in 0..header.song_count {
            let id = cursor.u32()?;
            let name = cursor.string()?;
            songs.push(SnapshotSong { id, name });
        }

        let mut buckets =
            Vec::with_capacity((header.code_count as usize).min(cursor.remaining() / 8));
        let mut posting_count = 0u64;
        for _ in 0..header.code_count {
            let code = cursor.u32()?;
            let n = cursor.u32()? as usize;
            if n > cursor.remaining() / 8 {
                return Err(FpError::Truncated("postings"));
            }
            let mut postings = Vec::with_capacity(n);
            for _ in 0..n {
                postings.push((cursor.u32()?, cursor.u32()?));
            }
            posting_count += n as u64;
            buckets.push(SnapshotBucket { code, postings });
        }

        if cursor.remaining() != 0 {
            return Err(FpError::Inconsistent(format!(
                "{} trailing payload bytes",
                cursor.remaining()
            )));
        }
        if posting_count != header.posting_count {
            return Err(FpError::Inconsistent(format!(
                "header declares {} postings, payload holds {}",
                header.posting_count, posting_count
            )));
        }

        Ok(SnapshotFile {
            header,
            config_json,
            songs,
            buckets,
        })
    }
}

/// Bounds-checked little-endian reads over a byte slice
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], FpError> {
        if n > self.remaining() {
            return Err(FpError::Truncated(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FpError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, "fixed-width field")?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, FpError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, FpError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, FpError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn string(&mut self) -> Result<String, FpError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len, "string")?;
        String::from_utf8(bytes.to_vec()).map_err(|_| FpError::InvalidName)
    }
}
