//! Ringabell snapshot file format library

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{
    FpError, SnapshotBucket, SnapshotFile, SnapshotHeader, SnapshotSong, CRC64, HEADER_SIZE, MAGIC,
    VERSION,
};
pub use reader::SnapshotReader;
pub use writer::SnapshotWriter;
