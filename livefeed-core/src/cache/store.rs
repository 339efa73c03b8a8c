// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache stores
//!
//! The file store keeps one JSON document per key in a local directory,
//! using atomic writes to prevent partial files on crash/interruption.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use super::types::CacheEntry;

/// Backing store for [`CacheEntry`] values.
///
/// Writes replace the whole entry for a key; the last writer wins.
pub trait CacheStore: Send + Sync {
    /// Returns the entry for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Stores `entry`, replacing any previous entry for its key.
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Removes the entry for `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// In-memory store; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.entries
            .lock()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Durable store under `<storage_path>/responses/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    cache_dir: PathBuf,
}

impl FileCacheStore {
    /// Opens a store at the given storage path
    ///
    /// Creates a `responses/` subdirectory if it doesn't exist.
    pub fn open(storage_path: &Path) -> Result<Self, CacheError> {
        let cache_dir = storage_path.join("responses");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// Directory holding the entry files.
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self.cache_dir.join(format!("{}.json", key)))
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(&entry.key)?;
        let data = serde_json::to_vec_pretty(entry)?;
        atomic_write(&path, &data)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// Atomic file write (write to temp, then rename)
///
/// This ensures that the file is never in a partial state - either the
/// old content remains or the new content is fully written.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let temp_path = path.with_extension("tmp");

    // Write to temp file
    fs::write(&temp_path, data)?;

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Errors that can occur with the cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key cannot be used as a file name
    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),
}
