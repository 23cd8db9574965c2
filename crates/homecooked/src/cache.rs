//! On-disk JSON cache
//!
//! One file per key under a per-tool directory. Entries are never evicted or
//! invalidated; delete the directory to start over. Keys are unique per item,
//! so concurrent tasks never touch the same file.

use crate::prelude::*;
use homecooked_core::cache::entry_file_name;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cache/homecooked/<tool>` unless `dir` overrides it.
    pub fn for_tool(dir: Option<PathBuf>, tool: &str) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => dirs_next::cache_dir()
                .ok_or_eyre("Could not determine the user cache directory")?
                .join("homecooked")
                .join(tool),
        };
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(key))
    }

    /// Read an entry. Missing and unreadable entries are both misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).wrap_err_with(|| f!("Failed to read cache entry {}", path.display()))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write an entry, replacing any previous value.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .wrap_err_with(|| f!("Failed to create cache directory {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(value).wrap_err("Failed to serialize cache entry")?;

        tokio::fs::write(&tmp, bytes)
            .await
            .wrap_err_with(|| f!("Failed to write cache entry {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .wrap_err_with(|| f!("Failed to move cache entry into {}", path.display()))?;

        Ok(())
    }
}
