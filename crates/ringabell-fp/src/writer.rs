//! Snapshot writer

use crate::format::{FpError, SnapshotFile, SnapshotHeader, CRC64};
use std::io::Write;

const ZSTD_LEVEL: i32 = 3;

pub struct SnapshotWriter {
    compress: bool,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// Compress the payload with zstd
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Write a snapshot. Header checksum, size and flags are filled in here.
    pub fn write<W: Write>(&self, writer: &mut W, file: &SnapshotFile) -> Result<(), FpError> {
        let payload = self.encode_payload(file)?;

        let mut header = file.header.clone();
        header.payload_size = payload.len() as u64;
        header.checksum = CRC64.checksum(&payload);
        header.set_compressed(self.compress);

        self.write_header(writer, &header)?;

        if self.compress {
            let packed = zstd::encode_all(&payload[..], ZSTD_LEVEL)
                .map_err(|e| FpError::Compression(e.to_string()))?;
            writer.write_all(&packed)?;
        } else {
            writer.write_all(&payload)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn write_header<W: Write>(&self, writer: &mut W, header: &SnapshotHeader) -> Result<(), FpError> {
        // Write as little-endian binary
        writer.write_all(&header.magic)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&header.flags.to_le_bytes())?;
        writer.write_all(&header.song_count.to_le_bytes())?;
        writer.write_all(&header.next_song_id.to_le_bytes())?;
        writer.write_all(&header.code_count.to_le_bytes())?;
        writer.write_all(&header.reserved.to_le_bytes())?;
        writer.write_all(&header.posting_count.to_le_bytes())?;
        writer.write_all(&header.payload_size.to_le_bytes())?;
        writer.write_all(&header.checksum.to_le_bytes())?;
        Ok(())
    }

    fn encode_payload(&self, file: &SnapshotFile) -> Result<Vec<u8>, FpError> {
        let posting_bytes = file.header.posting_count as usize * 8;
        let mut payload = Vec::with_capacity(4 + file.config_json.len() + posting_bytes);

        write_bytes(&mut payload, file.config_json.as_bytes())?;

        for song in &file.songs {
            payload.extend_from_slice(&song.id.to_le_bytes());
            write_bytes(&mut payload, song.name.as_bytes())?;
        }

        for bucket in &file.buckets {
            payload.extend_from_slice(&bucket.code.to_le_bytes());
            payload.extend_from_slice(&len_u32(bucket.postings.len())?.to_le_bytes());
            for (song_id, anchor_time) in &bucket.postings {
                payload.extend_from_slice(&song_id.to_le_bytes());
                payload.extend_from_slice(&anchor_time.to_le_bytes());
            }
        }

        Ok(payload)
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Length-prefixed byte string
fn write_bytes(payload: &mut Vec<u8>, bytes: &[u8]) -> Result<(), FpError> {
    payload.extend_from_slice(&len_u32(bytes.len())?.to_le_bytes());
    payload.extend_from_slice(bytes);
    Ok(())
}

fn len_u32(len: usize) -> Result<u32, FpError> {
    u32::try_from(len).map_err(|_| FpError::Inconsistent(format!("length {} exceeds u32", len)))
}
