//! Content-addressed store of downstream artifacts, one JSON record per key.
//!
//! Records are never evicted; [`ResultCache::clear`] is the only way to drop
//! them. A record is written to a temporary file in the cache directory and
//! renamed into place, so readers see either the whole record or none.

mod key;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{ArchError, Result};

pub use key::CacheKey;

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheRecordInfo {
    pub key_prefix: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub directory: PathBuf,
    pub records: Vec<CacheRecordInfo>,
}

impl CacheInfo {
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Opens (creating if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ArchError::cache_io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_for<T: Serialize + ?Sized>(&self, value: &T) -> Result<CacheKey> {
        CacheKey::for_value(value)
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    pub fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ArchError::cache_io(path, e)),
        }
    }

    pub fn put(&self, key: &CacheKey, artifact: &str) -> Result<()> {
        let path = self.record_path(key);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| ArchError::cache_io(&self.dir, e))?;
        tmp.write_all(artifact.as_bytes())
            .map_err(|e| ArchError::cache_io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| ArchError::cache_io(&path, e.error))?;
        tracing::debug!("Cached {} ({} bytes)", key.prefix(), artifact.len());
        Ok(())
    }

    /// Returns the cached artifact for `key`, or computes and stores it.
    /// Cache IO failures are logged and the artifact is recomputed; only
    /// `compute` errors reach the caller.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        match self.get(key) {
            Ok(Some(artifact)) => {
                tracing::debug!("Cache hit {}", key.prefix());
                return Ok(artifact);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed, recomputing: {}", e),
        }

        let artifact = compute()?;
        if let Err(e) = self.put(key, &artifact) {
            tracing::warn!("Cache write failed: {}", e);
        }
        Ok(artifact)
    }

    /// Removes every record. Returns how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.record_paths()? {
            fs::remove_file(&path).map_err(|e| ArchError::cache_io(&path, e))?;
            removed += 1;
        }
        tracing::info!("Cleared {} cache records from {}", removed, self.dir.display());
        Ok(removed)
    }

    pub fn info(&self) -> Result<CacheInfo> {
        let mut records = Vec::new();
        for path in self.record_paths()? {
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(CacheKey::parse)
            else {
                continue;
            };
            let size_bytes = fs::metadata(&path)
                .map_err(|e| ArchError::cache_io(&path, e))?
                .len();
            records.push(CacheRecordInfo {
                key_prefix: key.prefix().to_string(),
                size_bytes,
            });
        }
        Ok(CacheInfo {
            directory: self.dir.clone(),
            records,
        })
    }

    /// Record files currently in the cache, sorted by name.
    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            RECORD_EXTENSION
        );
        let entries = glob::glob(&pattern).map_err(|e| ArchError::Parse(e.to_string()))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Skipping unreadable cache entry: {}", e);
                    None
                }
            })
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(CacheKey::parse)
                    .is_some()
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}
