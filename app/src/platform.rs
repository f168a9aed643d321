//! Desktop integration for the shell

use async_trait::async_trait;
use lunary_core::{DirectoryPicker, FileLauncher};
use std::path::Path;
use tracing::{debug, warn};

/// Opens files through the desktop's default handlers
pub struct OpenLauncher;

impl FileLauncher for OpenLauncher {
    fn open(&self, path: &Path) {
        debug!("Opening {}", path.display());
        if let Err(e) = open::that_detached(path) {
            warn!("Failed to open {}: {}", path.display(), e);
        }
    }

    fn reveal(&self, path: &Path) {
        let folder = path.parent().unwrap_or(path);
        debug!("Revealing {} in {}", path.display(), folder.display());
        if let Err(e) = open::that_detached(folder) {
            warn!("Failed to reveal {}: {}", path.display(), e);
        }
    }
}

/// Picker fed with paths typed on the command line.
///
/// Paths are made absolute; anything that is not an existing directory is
/// skipped.
pub struct ArgsPicker {
    paths: Vec<String>,
}

impl ArgsPicker {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DirectoryPicker for ArgsPicker {
    async fn pick_directories(&self) -> Vec<String> {
        let mut picked = Vec::new();
        for path in &self.paths {
            let absolute = match tokio::fs::canonicalize(path).await {
                Ok(absolute) => absolute,
                Err(e) => {
                    warn!("Cannot use {}: {}", path, e);
                    continue;
                }
            };
            match tokio::fs::metadata(&absolute).await {
                Ok(metadata) if metadata.is_dir() => {
                    picked.push(absolute.to_string_lossy().into_owned());
                }
                Ok(_) => warn!("Not a directory: {}", absolute.display()),
                Err(e) => warn!("Cannot use {}: {}", absolute.display(), e),
            }
        }
        picked
    }
}
