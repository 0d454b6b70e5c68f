//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml` inside the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::{SortOrder, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "taskboard.toml";

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "TASKBOARD_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Attachment storage configuration
    #[serde(default)]
    pub attachments: AttachmentsConfig,

    /// List/board presentation defaults
    #[serde(default)]
    pub board: BoardConfig,

    /// Persisted sign-in
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Collection file, relative to the data directory
    #[serde(default = "default_store_file")]
    pub file: PathBuf,

    /// How long to wait for the collection lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_store_file() -> PathBuf {
    PathBuf::from("tasks.json")
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: default_store_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Object store root, relative to the data directory
    #[serde(default = "default_attachments_dir")]
    pub dir: PathBuf,
}

fn default_attachments_dir() -> PathBuf {
    PathBuf::from("attachments")
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            dir: default_attachments_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Tasks shown per section before "load more"
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Sort applied when none is given: manual, due_asc or due_desc
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_sort() -> String {
    SortOrder::Manual.as_str().to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: default_sort(),
        }
    }
}

impl BoardConfig {
    pub fn sort(&self) -> Result<SortOrder> {
        self.default_sort
            .parse()
            .map_err(|_| Error::InvalidConfig(format!(
                "board.default_sort: unknown sort '{}' (expected manual|due_asc|due_desc)",
                self.default_sort
            )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signed-in identity, relative to the data directory
    #[serde(default = "default_session_file")]
    pub file: PathBuf,
}

fn default_session_file() -> PathBuf {
    PathBuf::from("session.json")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
        }
    }
}

/// Default data directory: `TASKBOARD_DATA_DIR`, else the platform data dir.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Ok(raw) = std::env::var(DATA_DIR_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    directories::ProjectDirs::from("", "", "taskboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::InvalidConfig("cannot determine a data directory; pass --data-dir".to_string()))
}

impl Config {
    /// Load configuration from a `taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the data directory, or return defaults when no file exists
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store.file)
    }

    pub fn attachments_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.attachments.dir)
    }

    pub fn session_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.session.file)
    }

    fn validate(&self) -> Result<()> {
        validate_path(&self.store.file, "store.file")?;
        validate_path(&self.attachments.dir, "attachments.dir")?;
        validate_path(&self.session.file, "session.file")?;
        if self.board.page_size == 0 {
            return Err(Error::InvalidConfig(
                "board.page_size must be > 0".to_string(),
            ));
        }
        self.board.sort()?;
        Ok(())
    }
}

fn validate_path(path: &Path, field: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
    }
    Ok(())
}
