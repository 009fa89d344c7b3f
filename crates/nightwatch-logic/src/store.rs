//! Persistent key-value store for progress between nights.
//!
//! Values are plain strings. [`MemoryStore`] keeps them in a map;
//! [`JsonFileStore`] mirrors the map into a JSON object on disk and rewrites
//! the file on every `set`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::night::NightOutcome;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Integer value of `key`, treating missing or non-numeric as zero.
    fn get_count(&self, key: &str) -> u64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    fn increment(&mut self, key: &str) -> Result<u64, StoreError> {
        let next = self.get_count(key) + 1;
        self.set(key, &next.to_string())?;
        Ok(next)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        log::debug!("opened store {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

impl NightOutcome {
    /// Count this attempt of `night`, and the completion if it was survived.
    pub fn record(self, store: &mut dyn KeyValueStore, night: &str) -> Result<(), StoreError> {
        store.increment(&format!("{night}.attempts"))?;
        if self == NightOutcome::Completed {
            store.increment(&format!("{night}.completed"))?;
        }
        Ok(())
    }
}
