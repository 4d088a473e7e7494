//! Key-value blob storage for registry state
//!
//! The registry persists one JSON blob under a namespaced key. A missing,
//! unreadable or malformed blob loads as `Value::Null` so callers can fall
//! back to defaults.

use anyhow::Context;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Named blob storage
pub trait Storage: Send + Sync {
    /// Load the blob stored under `key`, `Value::Null` if there is none
    fn load(&self, key: &str) -> Value;

    /// Replace the blob stored under `key`
    fn save(&self, blob: &Value, key: &str) -> anyhow::Result<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn load(&self, key: &str) -> Value {
        (**self).load(key)
    }

    fn save(&self, blob: &Value, key: &str) -> anyhow::Result<()> {
        (**self).save(blob, key)
    }
}

/// Stores each blob as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn blob_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Value {
        let path = self.blob_path(key);
        if !path.exists() {
            log::debug!("No stored blob for {} at {}", key, path.display());
            return Value::Null;
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    log::error!("Failed to parse stored blob {}: {}", path.display(), e);
                    Value::Null
                }
            },
            Err(e) => {
                log::error!("Failed to read stored blob {}: {}", path.display(), e);
                Value::Null
            }
        }
    }

    fn save(&self, blob: &Value, key: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage dir {}", self.dir.display()))?;

        let path = self.blob_path(key);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(blob).context("Failed to serialize blob")?;

        // Write then rename so readers never see a half-written blob
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to move blob into {}", path.display()))?;

        log::debug!("Stored blob {} at {}", key, path.display());
        Ok(())
    }
}

/// In-process storage, shared between registry instances through `Arc`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob directly, bypassing any registry
    pub fn insert(&self, key: &str, blob: Value) {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), blob);
    }

    /// Raw blob under `key`, if any
    pub fn get(&self, key: &str) -> Option<Value> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Value {
        self.get(key).unwrap_or(Value::Null)
    }

    fn save(&self, blob: &Value, key: &str) -> anyhow::Result<()> {
        self.insert(key, blob.clone());
        Ok(())
    }
}
