//! Typed repositories over the config store

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ConfigStore, DocumentKey};
use crate::config::{AppSettings, SettingsPatch, ThemePreference};
use crate::error::LunaryResult;
use crate::index::WatchedDirectories;
use crate::platform::DirectoryPicker;
use crate::types::{DirectoryConfig, IndexStatus};

/// Persists [`AppSettings`]
#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<ConfigStore>,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Load settings, or defaults when nothing usable is stored
    pub async fn load(&self) -> AppSettings {
        self.store
            .read::<AppSettings>(&DocumentKey::SETTINGS)
            .await
            .unwrap_or_default()
    }

    /// Save settings after restoring their invariants
    pub async fn save(&self, settings: &AppSettings) {
        self.store
            .write(&DocumentKey::SETTINGS, &settings.normalized())
            .await;
    }

    /// Apply a validated section patch and save the result
    pub async fn update(&self, patch: SettingsPatch) -> LunaryResult<AppSettings> {
        let mut settings = self.load().await;
        settings.apply_patch(patch)?;
        self.save(&settings).await;
        Ok(settings.normalized())
    }

    /// Overwrite only `ui.theme`
    pub async fn set_theme(&self, theme: ThemePreference) -> AppSettings {
        let mut settings = self.load().await;
        settings.ui.theme = theme;
        self.save(&settings).await;
        debug!("Stored theme preference: {}", theme);
        settings
    }

    /// Add an exclude pattern. Returns `false` if it was blank or already present.
    pub async fn add_exclude_pattern(&self, pattern: &str) -> bool {
        let mut settings = self.load().await;
        if !settings.add_exclude_pattern(pattern) {
            return false;
        }
        self.save(&settings).await;
        true
    }

    /// Remove an exclude pattern. Returns `false` if it was not present.
    pub async fn remove_exclude_pattern(&self, pattern: &str) -> bool {
        let mut settings = self.load().await;
        if !settings.remove_exclude_pattern(pattern) {
            return false;
        }
        self.save(&settings).await;
        true
    }

    /// Replace stored settings with defaults
    pub async fn reset(&self) -> AppSettings {
        let settings = AppSettings::default();
        self.save(&settings).await;
        info!("Settings reset to defaults");
        settings
    }
}

/// Persists the list of watched folders
#[derive(Clone)]
pub struct DirectoryRepository {
    store: Arc<ConfigStore>,
}

impl DirectoryRepository {
    /// Create a new directory repository
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Load watched folders, or an empty list when nothing usable is stored
    pub async fn load(&self) -> Vec<DirectoryConfig> {
        self.load_list().await.into_entries()
    }

    /// Save folders, dropping repeated paths (the first entry wins)
    pub async fn save(&self, directories: &[DirectoryConfig]) {
        let list = WatchedDirectories::from_entries(directories.to_vec());
        self.save_list(&list).await;
    }

    /// Add folders by path and return the resulting list
    pub async fn add_directories<S: AsRef<str>>(&self, paths: &[S]) -> Vec<DirectoryConfig> {
        let mut list = self.load_list().await;
        let added = list.add_paths(paths);
        if added > 0 {
            self.save_list(&list).await;
            info!("Watching {} new folder(s)", added);
        }
        list.into_entries()
    }

    /// Ask the picker for folders and add them
    pub async fn add_from_picker(&self, picker: &dyn DirectoryPicker) -> Vec<DirectoryConfig> {
        let picked = picker.pick_directories().await;
        if picked.is_empty() {
            debug!("Folder selection cancelled");
            return self.load().await;
        }
        self.add_directories(&picked).await
    }

    /// Stop watching a folder and return the resulting list
    pub async fn remove(&self, path: &str) -> Vec<DirectoryConfig> {
        self.modify(|list| list.remove(path)).await
    }

    /// Flip `enabled` for one folder and return the resulting list
    pub async fn toggle_enabled(&self, path: &str) -> Vec<DirectoryConfig> {
        self.modify(|list| list.toggle_enabled(path)).await
    }

    /// Flip `recursive` for one folder and return the resulting list
    pub async fn toggle_recursive(&self, path: &str) -> Vec<DirectoryConfig> {
        self.modify(|list| list.toggle_recursive(path)).await
    }

    /// Stamp enabled folders as indexed at `at` (epoch milliseconds)
    pub async fn mark_indexed(&self, at: i64) -> Vec<DirectoryConfig> {
        self.modify(|list| {
            list.mark_enabled_indexed(at);
            true
        })
        .await
    }

    async fn load_list(&self) -> WatchedDirectories {
        let entries = self
            .store
            .read::<Vec<DirectoryConfig>>(&DocumentKey::DIRECTORIES)
            .await
            .unwrap_or_default();
        WatchedDirectories::from_entries(entries)
    }

    async fn save_list(&self, list: &WatchedDirectories) {
        self.store.write(&DocumentKey::DIRECTORIES, list.entries()).await;
    }

    async fn modify<F>(&self, change: F) -> Vec<DirectoryConfig>
    where
        F: FnOnce(&mut WatchedDirectories) -> bool,
    {
        let mut list = self.load_list().await;
        if change(&mut list) {
            self.save_list(&list).await;
        }
        list.into_entries()
    }
}

/// Persists the latest [`IndexStatus`].
///
/// Progress of a running rebuild is kept in memory through
/// [`report_progress`](Self::report_progress) and only hits the store on
/// [`save`](Self::save).
#[derive(Clone)]
pub struct IndexStatusRepository {
    store: Arc<ConfigStore>,
    live: Arc<RwLock<Option<IndexStatus>>>,
}

impl IndexStatusRepository {
    /// Create a new index status repository
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            live: Arc::new(RwLock::new(None)),
        }
    }

    /// Record the progress of a running rebuild without persisting it
    pub fn report_progress(&self, status: &IndexStatus) {
        *self.live.write() = status.is_indexing.then(|| status.normalized());
    }

    /// The running rebuild's progress, or the stored status when none runs
    pub async fn current(&self) -> IndexStatus {
        let live = self.live.read().clone();
        match live {
            Some(status) => status,
            None => self.load().await,
        }
    }

    /// Load the status, or an idle zero status when nothing usable is stored
    pub async fn load(&self) -> IndexStatus {
        self.store
            .read::<IndexStatus>(&DocumentKey::INDEX_STATUS)
            .await
            .unwrap_or_default()
    }

    /// Save the status with `indexed_files <= total_files`. Ends any
    /// progress recorded with [`report_progress`](Self::report_progress).
    pub async fn save(&self, status: &IndexStatus) {
        self.live.write().take();
        self.store
            .write(&DocumentKey::INDEX_STATUS, &status.normalized())
            .await;
    }
}
