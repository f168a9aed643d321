//! Flat key-value fallback storage

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use super::{DocumentKey, StorageBackend};
use crate::error::{LunaryError, LunaryResult};

/// String-keyed store addressed by [`DocumentKey::flat_key`].
///
/// Entries always live in memory. When opened with a mirror path, the whole map
/// is also written to that single JSON file after every change so the values
/// survive a restart.
pub struct KeyValueBackend {
    /// Stored entries
    entries: RwLock<BTreeMap<String, String>>,
    /// Optional on-disk mirror
    mirror: Option<PathBuf>,
    /// Held for the whole of a mirror flush so flushes never interleave
    flushing: AsyncMutex<()>,
}

impl KeyValueBackend {
    /// Create a store that lives only for this process
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            mirror: None,
            flushing: AsyncMutex::new(()),
        }
    }

    /// Create a store mirrored to `path`, loading any entries already there
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable fallback store {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) => {
                debug!("No fallback store at {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            entries: RwLock::new(entries),
            mirror: Some(path),
            flushing: AsyncMutex::new(()),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Write the current map to the mirror, if there is one.
    ///
    /// The snapshot is taken after the flush lock is acquired, so the last
    /// flush to finish always carries every change made before it started.
    async fn sync_mirror(&self) -> LunaryResult<()> {
        let Some(path) = &self.mirror else {
            return Ok(());
        };
        let _flushing = self.flushing.lock().await;
        let snapshot = serde_json::to_string(&*self.entries.read())?;
        // The in-memory copy is authoritative for this session even if the mirror fails
        Self::flush(path, snapshot).await;
        Ok(())
    }

    async fn flush(path: &Path, snapshot: String) {
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Cannot create fallback store directory {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(path, snapshot).await {
            warn!("Cannot mirror fallback store to {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl StorageBackend for KeyValueBackend {
    fn name(&self) -> &'static str {
        "key-value"
    }

    async fn read(&self, key: &DocumentKey) -> LunaryResult<String> {
        self.entries
            .read()
            .get(key.flat_key)
            .cloned()
            .ok_or_else(|| LunaryError::not_found(key.flat_key))
    }

    async fn write(&self, key: &DocumentKey, contents: &str) -> LunaryResult<()> {
        self.entries
            .write()
            .insert(key.flat_key.to_string(), contents.to_string());
        self.sync_mirror().await
    }

    async fn remove(&self, key: &DocumentKey) -> LunaryResult<()> {
        if self.entries.write().remove(key.flat_key).is_none() {
            return Ok(());
        }
        self.sync_mirror().await
    }
}
