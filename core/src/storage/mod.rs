//! Storage layer for Lunary
//!
//! Documents are JSON-encoded and written through an ordered list of backends.
//! The first backend that succeeds wins; failures fall through to the next one
//! and are only logged, so losing a preference file never interrupts a session.
//! When a lower-priority backend takes a write, stale copies above it are
//! removed and reads go to that backend first for the rest of the process.

pub mod file;
pub mod keyvalue;
pub mod repository;

pub use file::FileBackend;
pub use keyvalue::KeyValueBackend;
pub use repository::{DirectoryRepository, IndexStatusRepository, SettingsRepository};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::{LunaryError, LunaryResult};

/// Location of one persisted document in every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    /// Sub-directories below the config root
    pub namespace: &'static [&'static str],
    /// File name inside the namespace
    pub name: &'static str,
    /// Flat key used by key-value backends
    pub flat_key: &'static str,
}

impl DocumentKey {
    /// `settings.json`
    pub const SETTINGS: DocumentKey = DocumentKey {
        namespace: &[],
        name: "settings.json",
        flat_key: "lunary.settings",
    };

    /// `directories.json`
    pub const DIRECTORIES: DocumentKey = DocumentKey {
        namespace: &[],
        name: "directories.json",
        flat_key: "lunary.directories",
    };

    /// `indexes/default/status.json`
    pub const INDEX_STATUS: DocumentKey = DocumentKey {
        namespace: &["indexes", "default"],
        name: "status.json",
        flat_key: "lunary.indexStatus",
    };

    /// Path of the document relative to a backend root
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.namespace.iter().collect();
        path.push(self.name);
        path
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// A place documents can be persisted to
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Read the encoded document stored under `key`
    async fn read(&self, key: &DocumentKey) -> LunaryResult<String>;

    /// Store the encoded document under `key`
    async fn write(&self, key: &DocumentKey, contents: &str) -> LunaryResult<()>;

    /// Delete the document stored under `key`. Removing a missing document succeeds.
    async fn remove(&self, key: &DocumentKey) -> LunaryResult<()> {
        Err(LunaryError::unsupported(format!("{} backend cannot remove {}", self.name(), key)))
    }
}

/// Typed document store over an ordered list of backends
#[derive(Clone)]
pub struct ConfigStore {
    backends: Vec<Arc<dyn StorageBackend>>,
    /// Backend index holding the newest copy, per flat key, when not the first
    newest: Arc<RwLock<HashMap<&'static str, usize>>>,
}

impl ConfigStore {
    /// Create a store trying `backends` in the given order
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>) -> Self {
        Self {
            backends,
            newest: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// File storage under `config_dir`, falling back to a key-value store
    /// mirrored into `data_dir`.
    pub async fn open(config_dir: impl Into<PathBuf>, data_dir: &Path) -> Self {
        let primary = FileBackend::new(config_dir);
        let fallback =
            KeyValueBackend::open(data_dir.join(crate::FALLBACK_STORE_FILENAME)).await;
        Self::new(vec![Arc::new(primary), Arc::new(fallback)])
    }

    /// Names of the configured backends, in preference order
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Read and decode a document.
    ///
    /// Returns `None` when no backend holds a decodable copy. Never fails.
    pub async fn read<T: DeserializeOwned>(&self, key: &DocumentKey) -> Option<T> {
        for index in self.read_order(key) {
            let backend = &self.backends[index];
            let contents = match backend.read(key).await {
                Ok(contents) => contents,
                Err(e) => {
                    debug!("{} backend could not read {}: {}", backend.name(), key, e);
                    continue;
                }
            };

            match serde_json::from_str::<T>(&contents) {
                Ok(document) => return Some(document),
                Err(e) => {
                    warn!("{} backend holds an undecodable {}: {}", backend.name(), key, e);
                }
            }
        }

        debug!("No stored copy of {}", key);
        None
    }

    /// Encode and persist a document in the first backend that accepts it.
    ///
    /// Failures are logged and never returned to the caller.
    pub async fn write<T: Serialize + Sync + ?Sized>(&self, key: &DocumentKey, document: &T) {
        let contents = match serde_json::to_string(document) {
            Ok(contents) => contents,
            Err(e) => {
                error!("Failed to encode {}: {}", key, e);
                return;
            }
        };

        for (index, backend) in self.backends.iter().enumerate() {
            match backend.write(key, &contents).await {
                Ok(()) => {
                    debug!("Stored {} in {} backend", key, backend.name());
                    self.mark_newest(key, index);
                    self.remove_stale(key, index).await;
                    return;
                }
                Err(e) => {
                    warn!("{} backend could not store {}: {}", backend.name(), key, e);
                }
            }
        }

        error!("Every storage backend rejected {}; the change is not persisted", key);
    }

    /// Backend indices to try when reading `key`, newest copy first
    fn read_order(&self, key: &DocumentKey) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.backends.len()).collect();
        if let Some(&newest) = self.newest.read().get(key.flat_key) {
            order.retain(|&index| index != newest);
            order.insert(0, newest);
        }
        order
    }

    fn mark_newest(&self, key: &DocumentKey, index: usize) {
        let mut newest = self.newest.write();
        if index == 0 {
            newest.remove(key.flat_key);
        } else {
            newest.insert(key.flat_key, index);
        }
    }

    /// Drop copies of `key` held by backends preferred over `index`
    async fn remove_stale(&self, key: &DocumentKey, index: usize) {
        for backend in &self.backends[..index] {
            if let Err(e) = backend.remove(key).await {
                warn!("{} backend keeps a stale {}: {}", backend.name(), key, e);
            }
        }
    }
}
