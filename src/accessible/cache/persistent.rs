use crate::error::{AccessError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Optional second cache layer that can outlive the process.
///
/// Purely an optimization: a miss or a failure only costs a recomputation.
pub trait PersistentCache: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Stable key for one kind of metadata of one class: hex SHA-256 of `"<kind>:<class>"`.
pub fn cache_key(kind: &str, class: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(class.as_bytes());
    hex::encode(hasher.finalize())
}

/// Filesystem cache: one file per key, sharded by the first two hex digits.
///
/// ```text
/// <root>/
/// ├── 3f/
/// │   └── 3fa4…e1.json
/// └── b0/
///     └── b07c…92.json
/// ```
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.len() < 2 || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AccessError::Cache(format!("Invalid cache key: {}", key)));
        }
        Ok(self.root.join(&key[..2]).join(format!("{}.json", key)))
    }
}

impl PersistentCache for FsCache {
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling temp file, then rename, so readers never see half an entry.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory persistent cache, for tests and for sharing between caches in one process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistentCache for MemoryCache {
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
