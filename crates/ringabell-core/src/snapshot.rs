//! Conversion between engine state and the snapshot file format

use crate::config::RingabellConfig;
use crate::error::{EngineError, Result};
use crate::index::{FingerprintIndex, Posting};
use crate::registry::Registry;
use ringabell_fp::{SnapshotBucket, SnapshotFile, SnapshotSong};

/// Flatten registry and index into a deterministic snapshot
pub(crate) fn to_snapshot(
    config: &RingabellConfig,
    registry: &Registry,
    index: &FingerprintIndex,
) -> Result<SnapshotFile> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| EngineError::InvalidConfig(format!("cannot serialize config: {}", e)))?;

    let songs = registry
        .songs()
        .into_iter()
        .map(|song| SnapshotSong {
            id: song.id,
            name: song.name,
        })
        .collect();

    let buckets = index
        .iter_sorted()
        .into_iter()
        .map(|(code, postings)| SnapshotBucket {
            code,
            postings: postings.iter().map(|p| (p.song_id, p.anchor_time)).collect(),
        })
        .collect();

    Ok(SnapshotFile::new(config_json, registry.next_id(), songs, buckets))
}

/// Rebuild registry and index by replaying a snapshot.
///
/// Fails without partial results if the snapshot was built with another
/// config or references songs it does not list.
pub(crate) fn from_snapshot(
    file: SnapshotFile,
    config: &RingabellConfig,
) -> Result<(Registry, FingerprintIndex)> {
    let stored: RingabellConfig = serde_json::from_str(&file.config_json)
        .map_err(|e| EngineError::IndexCorruption(format!("unreadable config section: {}", e)))?;
    if &stored != config {
        return Err(EngineError::InvalidConfig(
            "snapshot was built with a different algorithm config".into(),
        ));
    }

    let next_id = file.header.next_song_id;
    let mut registry = Registry::new();
    for song in file.songs {
        if song.id == 0 || song.id >= next_id {
            return Err(EngineError::IndexCorruption(format!(
                "song id {} outside 1..{}",
                song.id, next_id
            )));
        }
        registry.restore(song.id, song.name)?;
    }
    registry.set_next_id(next_id);

    let mut index = FingerprintIndex::new();
    let mut previous_code = None;
    for bucket in file.buckets {
        if previous_code.is_some_and(|prev| prev >= bucket.code) {
            return Err(EngineError::IndexCorruption(format!(
                "code {:#010x} out of order",
                bucket.code
            )));
        }
        previous_code = Some(bucket.code);

        let postings: Vec<Posting> = bucket
            .postings
            .iter()
            .map(|&(song_id, anchor_time)| Posting {
                song_id,
                anchor_time,
            })
            .collect();

        if let Some(dangling) = postings.iter().find(|p| !registry.contains(p.song_id)) {
            return Err(EngineError::IndexCorruption(format!(
                "code {:#010x} references unregistered song {}",
                bucket.code, dangling.song_id
            )));
        }

        index.insert_postings(bucket.code, &postings);
    }

    Ok((registry, index))
}
