//! Settings file for Ringabell tools
//!
//! TOML configuration selecting where the snapshot lives and overriding
//! algorithm constants. Every field has a default, so an empty file is valid.

use crate::config::RingabellConfig;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main settings structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RingabellSettings {
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub algorithm: RingabellConfig,
}

/// Snapshot location and encoding
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotSettings {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub compress: bool,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            compress: false,
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./ringabell.rbfp")
}

impl RingabellSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            EngineError::InvalidConfig(msg) => {
                EngineError::InvalidConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse and validate settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let settings: RingabellSettings = toml::from_str(content)
            .map_err(|e| EngineError::InvalidConfig(format!("failed to parse TOML: {}", e)))?;
        settings.algorithm.validate()?;
        Ok(settings)
    }
}
