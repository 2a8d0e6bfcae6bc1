//! Back-office settings, read from a TOML file.
//!
//! A missing file means defaults. A file that cannot be read or parsed is
//! logged and also yields defaults.

use crate::error::{BackofficeError, BackofficeResult};
use arbor_types::{EntityKind, NodeId, NodeKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Recycle-bin node ids of the two trees that have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleBinConfig {
    #[serde(default = "default_content_bin")]
    pub content_id: NodeId,
    #[serde(default = "default_media_bin")]
    pub media_id: NodeId,
}

fn default_content_bin() -> NodeId {
    NodeId::RECYCLE_BIN_CONTENT
}

fn default_media_bin() -> NodeId {
    NodeId::RECYCLE_BIN_MEDIA
}

impl Default for RecycleBinConfig {
    fn default() -> Self {
        Self {
            content_id: default_content_bin(),
            media_id: default_media_bin(),
        }
    }
}

/// Settings for the editorial core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackofficeConfig {
    /// Where uploaded files wait until a save request finishes.
    #[serde(default = "default_upload_temp_dir")]
    pub upload_temp_dir: PathBuf,
    /// Tag delimiter used when neither the data type nor its editor
    /// declares one.
    #[serde(default = "default_tag_delimiter")]
    pub default_tag_delimiter: char,
    /// Larger page requests are clamped to this size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Refuse to unpublish a node while it has published children.
    #[serde(default)]
    pub disable_unpublish_when_referenced: bool,
    #[serde(default)]
    pub recycle_bin: RecycleBinConfig,
    /// Data types whose pickers browse the whole tree regardless of the
    /// user's start nodes.
    #[serde(default)]
    pub ignore_start_nodes_data_types: Vec<NodeKey>,
}

fn default_upload_temp_dir() -> PathBuf {
    std::env::temp_dir().join("arbor-uploads")
}

fn default_tag_delimiter() -> char {
    ','
}

fn default_max_page_size() -> usize {
    1000
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        Self {
            upload_temp_dir: default_upload_temp_dir(),
            default_tag_delimiter: default_tag_delimiter(),
            max_page_size: default_max_page_size(),
            disable_unpublish_when_referenced: false,
            recycle_bin: RecycleBinConfig::default(),
            ignore_start_nodes_data_types: Vec::new(),
        }
    }
}

impl BackofficeConfig {
    /// Loads settings from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded back-office settings from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse settings file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parses settings from TOML text.
    pub fn parse(contents: &str) -> BackofficeResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| BackofficeError::Config(e.to_string()))?;
        if config.max_page_size == 0 {
            return Err(BackofficeError::Config("max_page_size must be at least 1".into()));
        }
        Ok(config)
    }

    /// Recycle-bin id for trees that have one.
    pub fn recycle_bin_for(&self, kind: EntityKind) -> Option<NodeId> {
        match kind {
            EntityKind::Document => Some(self.recycle_bin.content_id),
            EntityKind::Media => Some(self.recycle_bin.media_id),
            _ => None,
        }
    }
}
