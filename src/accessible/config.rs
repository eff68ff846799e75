//! # Configuration
//!
//! Configuration is loaded with [`confique`], layered in priority order:
//!
//! 1. **Environment variables**: `ACCESSIBLE_CACHE_DIR`, `ACCESSIBLE_VALIDATION`.
//! 2. **Explicit file**: the path given to `--config`.
//! 3. **User config**: `accessible.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `cache_dir` | unset | Directory for the persistent metadata cache |
//! | `validation` | `true` | Global constraint validation switch |

use crate::error::{AccessError, Result};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "accessible.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessibleConfig {
    /// Directory for the persistent metadata cache. No persistent cache when unset.
    #[config(env = "ACCESSIBLE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Global validation switch, combined with each class's own setting.
    #[config(env = "ACCESSIBLE_VALIDATION", default = true)]
    pub validation: bool,
}

impl Default for AccessibleConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            validation: true,
        }
    }
}

/// `accessible.toml` in the user's config directory, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "accessible").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl AccessibleConfig {
    /// Load the full layered configuration. `explicit` must exist when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut files = Vec::new();
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AccessError::Config(format!(
                    "Configuration file {} does not exist.",
                    path.display()
                )));
            }
            files.push(path.to_path_buf());
        }
        files.extend(user_config_path());
        Self::load_layers(&files, true)
    }

    /// Load from `files` (highest priority first), optionally on top of the environment.
    fn load_layers(files: &[PathBuf], env: bool) -> Result<Self> {
        let mut builder = Self::builder();
        if env {
            builder = builder.env();
        }
        for file in files {
            builder = builder.file(file);
        }
        builder
            .load()
            .map_err(|e| AccessError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_files() {
        let config = AccessibleConfig::load_layers(&[], false).unwrap();
        assert_eq!(config, AccessibleConfig::default());
        assert!(config.validation);
    }

    #[test]
    fn test_reads_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "cache_dir = \"/tmp/meta\"\nvalidation = false\n").unwrap();

        let config = AccessibleConfig::load_layers(&[path], false).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/meta")));
        assert!(!config.validation);
    }

    #[test]
    fn test_earlier_files_take_priority() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let user = dir.path().join("user.toml");
        fs::write(&explicit, "validation = false\n").unwrap();
        fs::write(&user, "validation = true\ncache_dir = \"/var/cache/meta\"\n").unwrap();

        let config = AccessibleConfig::load_layers(&[explicit, user], false).unwrap();
        assert!(!config.validation);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/meta")));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = AccessibleConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "validation = \"sometimes\"\n").unwrap();
        let err = AccessibleConfig::load_layers(&[path], false).unwrap_err();
        assert!(matches!(err, AccessError::Config(_)));
    }
}
