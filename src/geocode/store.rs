//! Durable storage for geocoding results.
//!
//! Every backend supports loading the whole cache and storing one entry; a
//! store call returns only once the entry is durable.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::models::GeoPoint;

/// Cached outcome of one lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CachedLocation {
    Found(GeoPoint),
    /// The provider answered without a match
    NotFound,
    /// The provider could not be reached at `at`
    Unavailable { at: DateTime<Utc> },
}

impl CachedLocation {
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            CachedLocation::Found(point) => Some(*point),
            _ => None,
        }
    }
}

pub trait CacheStore: Send + Sync {
    /// Every persisted entry
    fn load_all(&self) -> Result<HashMap<String, CachedLocation>>;

    /// Persist one entry without losing the others
    fn store(&mut self, key: &str, entry: &CachedLocation) -> Result<()>;
}

/// sled-backed store, one key per normalized address
pub struct SledStore {
    db: Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .with_context(|| format!("Failed to open geocode cache at {}", path.display()))?;
        info!("Opened geocode cache at {} ({} entries)", path.display(), db.len());
        Ok(Self { db })
    }
}

impl CacheStore for SledStore {
    fn load_all(&self) -> Result<HashMap<String, CachedLocation>> {
        let mut entries = HashMap::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let key = String::from_utf8_lossy(&key).into_owned();
            match serde_json::from_slice::<CachedLocation>(&value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => warn!("Skipping unreadable cache entry {}: {}", key, e),
            }
        }
        Ok(entries)
    }

    fn store(&mut self, key: &str, entry: &CachedLocation) -> Result<()> {
        let value = serde_json::to_vec(entry)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Single JSON document holding the whole cache.
///
/// Each store reloads the file, merges the new entry and atomically replaces it.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    fn write_all(&self, entries: &HashMap<String, CachedLocation>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut staged, entries)?;
        staged.flush()?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl CacheStore for JsonFileStore {
    fn load_all(&self) -> Result<HashMap<String, CachedLocation>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let entries = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(entries)
    }

    fn store(&mut self, key: &str, entry: &CachedLocation) -> Result<()> {
        let mut entries = self.load_all()?;
        entries.insert(key.to_string(), *entry);
        self.write_all(&entries)?;
        debug!("Cache file now holds {} entries", entries.len());
        Ok(())
    }
}

/// Non-durable store for tests and throwaway runs
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, CachedLocation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn load_all(&self) -> Result<HashMap<String, CachedLocation>> {
        Ok(self.entries.clone())
    }

    fn store(&mut self, key: &str, entry: &CachedLocation) -> Result<()> {
        self.entries.insert(key.to_string(), *entry);
        Ok(())
    }
}
