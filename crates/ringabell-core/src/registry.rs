//! Song registry: id <-> display name

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type SongId = u32;

/// A registered recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
}

/// Registry of songs. Names are unique; ids come from a counter that is
/// never rewound, so a removed id is not handed out again.
#[derive(Debug, Clone)]
pub struct Registry {
    songs: HashMap<SongId, Song>,
    by_name: HashMap<String, SongId>,
    next_id: SongId,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            songs: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `name` could be inserted
    pub fn ensure_available(&self, name: &str) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(EngineError::DuplicateSongName(name.to_string()));
        }
        Ok(())
    }

    /// Register `name` under a fresh id
    pub fn insert(&mut self, name: &str) -> Result<SongId> {
        self.ensure_available(name)?;

        let id = self.next_id;
        self.next_id += 1;
        self.songs.insert(
            id,
            Song {
                id,
                name: name.to_string(),
            },
        );
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Re-insert a song with a known id (snapshot replay)
    pub(crate) fn restore(&mut self, id: SongId, name: String) -> Result<()> {
        if self.songs.contains_key(&id) {
            return Err(EngineError::IndexCorruption(format!("song id {} listed twice", id)));
        }
        if self.by_name.contains_key(&name) {
            return Err(EngineError::IndexCorruption(format!("song name {:?} listed twice", name)));
        }
        self.by_name.insert(name.clone(), id);
        self.songs.insert(id, Song { id, name });
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    pub(crate) fn set_next_id(&mut self, next_id: SongId) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn get(&self, id: SongId) -> Option<&Song> {
        self.songs.get(&id)
    }

    pub fn contains(&self, id: SongId) -> bool {
        self.songs.contains_key(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<SongId> {
        self.by_name.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<Song> {
        let id = self.by_name.remove(name)?;
        self.songs.remove(&id)
    }

    /// Songs sorted by id
    pub fn songs(&self) -> Vec<Song> {
        let mut songs: Vec<Song> = self.songs.values().cloned().collect();
        songs.sort_by_key(|s| s.id);
        songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn next_id(&self) -> SongId {
        self.next_id
    }

    /// Forget every song. The id counter keeps running.
    pub fn clear(&mut self) {
        self.songs.clear();
        self.by_name.clear();
    }
}
