//! User preferences for Lunary

use serde::{Deserialize, Serialize};

use crate::error::{LunaryError, LunaryResult};

/// Smallest accepted auto-update interval (seconds)
pub const MIN_UPDATE_INTERVAL: u64 = 300;

/// Largest accepted auto-update interval (seconds)
pub const MAX_UPDATE_INTERVAL: u64 = 86_400;

/// Accepted match precision range
pub const MATCH_PRECISION_RANGE: (f64, f64) = (0.1, 1.0);

/// Accepted results-per-page range
pub const RESULTS_PER_PAGE_RANGE: (u32, u32) = (5, 100);

const MIB: u64 = 1024 * 1024;

/// Accepted maximum file size range (bytes)
pub const MAX_FILE_SIZE_RANGE: (u64, u64) = (MIB, 500 * MIB);

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Search settings
    pub search: SearchSettings,
    /// Indexing settings
    pub indexing: IndexingSettings,
    /// UI settings
    pub ui: UiSettings,
}

/// Search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    /// Preferred page size. Not tied to the live session page size.
    pub results_per_page: u32,
    /// Match precision in `[0.1, 1.0]`
    pub match_precision: f64,
    /// Highlight matched terms in snippets
    pub enable_highlighting: bool,
}

/// Indexing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexingSettings {
    /// Periodically refresh the index
    pub auto_update: bool,
    /// Refresh interval in seconds, only meaningful with `auto_update`
    pub update_interval: u64,
    /// Glob patterns skipped by the indexer, unique and ordered
    pub exclude_patterns: Vec<String>,
    /// Files larger than this (bytes) are not indexed
    pub max_file_size: u64,
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiSettings {
    /// Theme preference
    pub theme: ThemePreference,
    /// Interface language tag
    pub language: String,
    /// Show file thumbnails next to results
    pub show_thumbnails: bool,
}

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

impl ThemePreference {
    /// Resolve the effective dark flag given the OS preference
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            ThemePreference::Light => false,
            ThemePreference::Dark => true,
            ThemePreference::System => system_prefers_dark,
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemePreference::Light => write!(f, "light"),
            ThemePreference::Dark => write!(f, "dark"),
            ThemePreference::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for ThemePreference {
    type Err = LunaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(LunaryError::validation(format!("Unknown theme: {}", other))),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            results_per_page: 20,
            match_precision: 0.8,
            enable_highlighting: true,
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            auto_update: true,
            update_interval: 3600, // 1 hour
            exclude_patterns: vec![
                "*.tmp".to_string(),
                "*.log".to_string(),
                "node_modules/*".to_string(),
            ],
            max_file_size: 50 * MIB,
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: ThemePreference::System,
            language: "zh-CN".to_string(),
            show_thumbnails: true,
        }
    }
}

/// Partial update of one settings section
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsPatch {
    /// Update fields of the search section
    Search(SearchPatch),
    /// Update fields of the indexing section
    Indexing(IndexingPatch),
    /// Update fields of the UI section
    Ui(UiPatch),
}

/// Changes to [`SearchSettings`]; `None` leaves a field untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPatch {
    pub results_per_page: Option<u32>,
    pub match_precision: Option<f64>,
    pub enable_highlighting: Option<bool>,
}

/// Changes to [`IndexingSettings`]; `None` leaves a field untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexingPatch {
    pub auto_update: Option<bool>,
    pub update_interval: Option<u64>,
    pub exclude_patterns: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
}

/// Changes to [`UiSettings`]; `None` leaves a field untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiPatch {
    pub theme: Option<ThemePreference>,
    pub language: Option<String>,
    pub show_thumbnails: Option<bool>,
}

impl AppSettings {
    /// Apply a section patch after validating it against that section's bounds.
    ///
    /// On error the settings are left unchanged.
    pub fn apply_patch(&mut self, patch: SettingsPatch) -> LunaryResult<()> {
        match patch {
            SettingsPatch::Search(p) => {
                if let Some(n) = p.results_per_page {
                    let (min, max) = RESULTS_PER_PAGE_RANGE;
                    if !(min..=max).contains(&n) {
                        return Err(LunaryError::validation(format!(
                            "resultsPerPage must be between {} and {}",
                            min, max
                        )));
                    }
                }
                if let Some(precision) = p.match_precision {
                    let (min, max) = MATCH_PRECISION_RANGE;
                    if !(min..=max).contains(&precision) {
                        return Err(LunaryError::validation(format!(
                            "matchPrecision must be between {} and {}",
                            min, max
                        )));
                    }
                }

                let search = &mut self.search;
                if let Some(n) = p.results_per_page {
                    search.results_per_page = n;
                }
                if let Some(precision) = p.match_precision {
                    search.match_precision = precision;
                }
                if let Some(enabled) = p.enable_highlighting {
                    search.enable_highlighting = enabled;
                }
            }
            SettingsPatch::Indexing(p) => {
                if let Some(interval) = p.update_interval {
                    if !(MIN_UPDATE_INTERVAL..=MAX_UPDATE_INTERVAL).contains(&interval) {
                        return Err(LunaryError::validation(format!(
                            "updateInterval must be between {} and {} seconds",
                            MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL
                        )));
                    }
                }
                if let Some(size) = p.max_file_size {
                    let (min, max) = MAX_FILE_SIZE_RANGE;
                    if !(min..=max).contains(&size) {
                        return Err(LunaryError::validation(format!(
                            "maxFileSize must be between {} and {} bytes",
                            min, max
                        )));
                    }
                }
                if let Some(patterns) = &p.exclude_patterns {
                    if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
                        return Err(LunaryError::validation("exclude patterns cannot be empty"));
                    }
                }

                let indexing = &mut self.indexing;
                if let Some(auto_update) = p.auto_update {
                    indexing.auto_update = auto_update;
                }
                if let Some(interval) = p.update_interval {
                    indexing.update_interval = interval;
                }
                if let Some(patterns) = p.exclude_patterns {
                    indexing.exclude_patterns = dedup_preserving_order(patterns);
                }
                if let Some(size) = p.max_file_size {
                    indexing.max_file_size = size;
                }
            }
            SettingsPatch::Ui(p) => {
                if let Some(language) = &p.language {
                    if language.trim().is_empty() {
                        return Err(LunaryError::validation("language cannot be empty"));
                    }
                }

                let ui = &mut self.ui;
                if let Some(theme) = p.theme {
                    ui.theme = theme;
                }
                if let Some(language) = p.language {
                    ui.language = language;
                }
                if let Some(show) = p.show_thumbnails {
                    ui.show_thumbnails = show;
                }
            }
        }
        Ok(())
    }

    /// Return a copy with invariants restored: unique exclude patterns and
    /// numeric fields clamped into their accepted ranges.
    pub fn normalized(&self) -> Self {
        let mut settings = self.clone();

        settings.indexing.exclude_patterns =
            dedup_preserving_order(std::mem::take(&mut settings.indexing.exclude_patterns));

        let (min, max) = MATCH_PRECISION_RANGE;
        if settings.search.match_precision.is_nan() {
            settings.search.match_precision = SearchSettings::default().match_precision;
        }
        settings.search.match_precision = settings.search.match_precision.clamp(min, max);

        let (min, max) = RESULTS_PER_PAGE_RANGE;
        settings.search.results_per_page = settings.search.results_per_page.clamp(min, max);

        settings.indexing.update_interval = settings
            .indexing
            .update_interval
            .clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL);

        settings
    }

    /// Add an exclude pattern. Returns `false` if it was already present or blank.
    pub fn add_exclude_pattern(&mut self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if pattern.is_empty() || self.indexing.exclude_patterns.iter().any(|p| p == pattern) {
            return false;
        }
        self.indexing.exclude_patterns.push(pattern.to_string());
        true
    }

    /// Remove an exclude pattern. Returns `true` if something was removed.
    pub fn remove_exclude_pattern(&mut self, pattern: &str) -> bool {
        let before = self.indexing.exclude_patterns.len();
        self.indexing.exclude_patterns.retain(|p| p != pattern);
        self.indexing.exclude_patterns.len() != before
    }

    /// Override preferences from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(theme) = std::env::var("LUNARY_THEME") {
            match theme.parse() {
                Ok(theme) => self.ui.theme = theme,
                Err(e) => tracing::warn!("Ignoring LUNARY_THEME: {}", e),
            }
        }

        if let Ok(language) = std::env::var("LUNARY_LANGUAGE") {
            if !language.trim().is_empty() {
                self.ui.language = language;
            }
        }
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
