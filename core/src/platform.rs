//! Operating system collaborators: folder picker and file launcher

use async_trait::async_trait;
use std::path::Path;

/// Lets the user choose folders to watch
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// Ask for one or more folders. Returns absolute paths, or an empty list
    /// when the dialog was cancelled.
    async fn pick_directories(&self) -> Vec<String>;
}

/// Hands files over to the desktop shell.
///
/// Both calls are fire-and-forget: implementations log failures instead of
/// returning them.
pub trait FileLauncher: Send + Sync {
    /// Open a file with its default application
    fn open(&self, path: &Path);

    /// Show a file in the system file browser
    fn reveal(&self, path: &Path);
}
