//! Lunary Core Library
//!
//! This crate contains the client-side logic of the Lunary search shell, including:
//! - Settings model and validation
//! - Durable configuration storage with file and key-value fallback backends
//! - Typed repositories for settings, watched directories and index status
//! - The search session controller (debouncing, pagination, supersession)
//! - Session-scoped search history
//! - Traits for the external search engine, directory picker and file launcher

pub mod config;
pub mod error;
pub mod index;
pub mod platform;
pub mod search;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::{AppSettings, SettingsPatch, ThemePreference};
pub use error::{LunaryError, LunaryResult};
pub use index::{IndexProgressTracker, WatchedDirectories};
pub use platform::{DirectoryPicker, FileLauncher};
pub use search::{
    DatePreset, PageState, SearchEngine, SearchFilters, SearchHistory, SearchSession,
    SessionEvent, SessionPhase, SessionSnapshot,
};
pub use storage::{
    ConfigStore, DirectoryRepository, DocumentKey, IndexStatusRepository, SettingsRepository,
};
pub use types::{DirectoryConfig, IndexStatus, SearchRequest, SearchResponse, SearchResult};

use std::path::PathBuf;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Lunary";

/// Default configuration directory name
pub const CONFIG_DIR_NAME: &str = "lunary";

/// Name of the mirrored key-value fallback file inside the data directory
pub const FALLBACK_STORE_FILENAME: &str = "fallback-store.json";

/// Quiet period before a typed query is sent (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Maximum number of remembered queries
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Initialize the core library
pub fn init() -> LunaryResult<()> {
    tracing::info!("Initializing {} Core v{}", APP_NAME, VERSION);
    Ok(())
}

/// Get the default configuration directory.
///
/// `LUNARY_CONFIG_DIR` takes precedence over the platform location. The directory
/// is not created here; the file backend creates it on first write.
pub fn get_config_dir() -> PathBuf {
    std::env::var("LUNARY_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|_| {
            directories::ProjectDirs::from("", "", CONFIG_DIR_NAME)
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or(std::env::VarError::NotPresent)
        })
        .unwrap_or_else(|_| PathBuf::from(".lunary/config"))
}

/// Get the default data directory
pub fn get_data_dir() -> PathBuf {
    std::env::var("LUNARY_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|_| {
            directories::ProjectDirs::from("", "", CONFIG_DIR_NAME)
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(std::env::VarError::NotPresent)
        })
        .unwrap_or_else(|_| PathBuf::from(".lunary/data"))
}

/// Current wall-clock time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
