//! File storage under the application config directory

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DocumentKey, StorageBackend};
use crate::error::{LunaryError, LunaryResult};

/// Stores each document as its own JSON file below a root directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    /// Root directory
    root: PathBuf,
}

impl FileBackend {
    /// Create a file backend rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the full path of a document
    pub fn document_path(&self, key: &DocumentKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn read(&self, key: &DocumentKey) -> LunaryResult<String> {
        let path = self.document_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(LunaryError::not_found(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &DocumentKey, contents: &str) -> LunaryResult<()> {
        let path = self.document_path(key);

        // Ensure the namespace directory exists
        if let Some(parent) = path.parent() {
            if !tokio::fs::try_exists(parent).await.unwrap_or(false) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|_| LunaryError::DirCreateFailed(parent.to_path_buf()))?;
            }
        }

        tokio::fs::write(&path, contents).await?;
        Ok(())
    }

    async fn remove(&self, key: &DocumentKey) -> LunaryResult<()> {
        match tokio::fs::remove_file(self.document_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
