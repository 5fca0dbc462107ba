//! Configuration for where the save database lives
//!
//! The store either sits on disk as a single file or, mostly for tests,
//! entirely in memory. The front-end maps its `--save-file` flag onto this.

use std::path::{Path, PathBuf};

/// Default save database filename, created in the working directory.
pub const DEFAULT_SAVE_FILE: &str = "casefile.db";

/// Where the session store keeps its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file path; `None` selects an in-memory database that
    /// vanishes when the store is dropped
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Store sessions in the given database file
    pub fn on_disk<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Store sessions in memory only
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Whether this configuration persists across runs
    pub fn is_durable(&self) -> bool {
        self.path.is_some()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::on_disk(DEFAULT_SAVE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_working_directory_file() {
        let config = StoreConfig::default();
        assert_eq!(config.path, Some(PathBuf::from(DEFAULT_SAVE_FILE)));
        assert!(config.is_durable());
    }

    #[test]
    fn test_in_memory_is_not_durable() {
        let config = StoreConfig::in_memory();
        assert!(config.path.is_none());
        assert!(!config.is_durable());
    }

    #[test]
    fn test_on_disk_keeps_the_given_path() {
        let config = StoreConfig::on_disk("saves/slot.db");
        assert_eq!(config.path, Some(PathBuf::from("saves/slot.db")));
    }
}
