//! Search session for Lunary

pub mod engine;
pub mod history;
pub mod pagination;
pub mod scheduler;
pub mod session;

pub use engine::SearchEngine;
pub use history::SearchHistory;
pub use pagination::{PageState, PER_PAGE_OPTIONS};
pub use scheduler::{Scheduler, TaskHandle};
pub use session::{SearchSession, SessionEvent, SessionPhase, SessionSnapshot};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One day in milliseconds
pub const DAY_MS: i64 = 86_400_000;

/// File types offered as quick filters
pub const KNOWN_FILE_TYPES: [&str; 6] = ["txt", "md", "pdf", "doc", "xls", "ppt"];

/// Search filters sent along with every request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchFilters {
    /// Accepted file types; never `Some` of an empty set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_types: Option<BTreeSet<String>>,
    /// Modification time window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Named preset the date range was computed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_preset: Option<DatePreset>,
    /// File size window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_range: Option<SizeRange>,
}

/// Modification time window (epoch milliseconds, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DateRange {
    /// Check if a timestamp falls inside the window
    pub fn contains(&self, at: i64) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

/// File size window in bytes, inclusive. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

impl SizeRange {
    /// Check if a size falls inside the window
    pub fn contains(&self, size: u64) -> bool {
        self.min.map_or(true, |min| size >= min) && self.max.map_or(true, |max| size <= max)
    }
}

/// Named date window relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    #[default]
    Any,
    LastDay,
    LastWeek,
    LastMonth,
}

impl DatePreset {
    /// Length of the window in milliseconds
    pub fn span_ms(self) -> Option<i64> {
        match self {
            DatePreset::Any => None,
            DatePreset::LastDay => Some(DAY_MS),
            DatePreset::LastWeek => Some(7 * DAY_MS),
            DatePreset::LastMonth => Some(30 * DAY_MS),
        }
    }

    /// Expand into a concrete window ending at `now`
    pub fn range_at(self, now: i64) -> Option<DateRange> {
        self.span_ms().map(|span| DateRange {
            start: Some(now - span),
            end: Some(now),
        })
    }
}

impl std::str::FromStr for DatePreset {
    type Err = crate::error::LunaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(DatePreset::Any),
            "day" | "lastday" => Ok(DatePreset::LastDay),
            "week" | "lastweek" => Ok(DatePreset::LastWeek),
            "month" | "lastmonth" => Ok(DatePreset::LastMonth),
            other => Err(crate::error::LunaryError::validation(format!(
                "Unknown date preset: {}",
                other
            ))),
        }
    }
}

impl SearchFilters {
    /// Select a preset and recompute the date range from `now`.
    ///
    /// `Any` clears the range.
    pub fn set_date_preset(&mut self, preset: DatePreset, now: i64) {
        self.date_preset = Some(preset);
        self.date_range = preset.range_at(now);
    }

    /// Set an explicit date window, dropping any preset
    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_preset = None;
        self.date_range = range;
    }

    /// Flip one file type. Returns `true` if the type is now selected.
    pub fn toggle_file_type(&mut self, file_type: &str) -> bool {
        let file_type = file_type.trim().trim_start_matches('.').to_lowercase();
        if file_type.is_empty() {
            return false;
        }

        let mut types = self.file_types.take().unwrap_or_default();
        let selected = if types.remove(&file_type) {
            false
        } else {
            types.insert(file_type);
            true
        };
        if !types.is_empty() {
            self.file_types = Some(types);
        }
        selected
    }

    /// Check if a file type passes the filter
    pub fn accepts_file_type(&self, file_type: &str) -> bool {
        self.file_types
            .as_ref()
            .map_or(true, |types| types.contains(&file_type.to_lowercase()))
    }

    /// Set the file size window
    pub fn set_file_size_range(&mut self, range: Option<SizeRange>) {
        self.file_size_range = range;
    }

    /// Drop every filter
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check if nothing is filtered
    pub fn is_empty(&self) -> bool {
        self.file_types.is_none() && self.date_range.is_none() && self.file_size_range.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_last_week_preset() {
        let mut filters = SearchFilters::default();
        filters.set_date_preset(DatePreset::LastWeek, NOW);

        assert_eq!(
            filters.date_range,
            Some(DateRange {
                start: Some(NOW - 604_800_000),
                end: Some(NOW),
            })
        );
        assert_eq!(filters.date_preset, Some(DatePreset::LastWeek));
    }

    #[test]
    fn test_any_preset_clears_range() {
        let mut filters = SearchFilters::default();
        filters.set_date_preset(DatePreset::LastMonth, NOW);
        assert_eq!(filters.date_range.unwrap().start, Some(NOW - 2_592_000_000));

        filters.set_date_preset(DatePreset::Any, NOW);
        assert!(filters.date_range.is_none());
        assert!(filters.is_empty());
    }

    #[test]
    fn test_toggle_file_type_never_stores_empty_set() {
        let mut filters = SearchFilters::default();
        assert!(filters.toggle_file_type("PDF"));
        assert!(filters.toggle_file_type(".md"));
        assert!(!filters.accepts_file_type("txt"));
        assert!(filters.accepts_file_type("pdf"));

        assert!(!filters.toggle_file_type("pdf"));
        assert!(!filters.toggle_file_type("md"));
        assert_eq!(filters.file_types, None);
        assert!(filters.accepts_file_type("txt"));
    }

    #[test]
    fn test_custom_range_drops_preset() {
        let mut filters = SearchFilters::default();
        filters.set_date_preset(DatePreset::LastDay, NOW);
        filters.set_date_range(Some(DateRange {
            start: Some(1),
            end: None,
        }));

        assert_eq!(filters.date_preset, None);
        assert!(filters.date_range.unwrap().contains(NOW));
        assert!(!filters.date_range.unwrap().contains(0));
    }

    #[test]
    fn test_filters_json_shape() {
        let mut filters = SearchFilters::default();
        filters.toggle_file_type("pdf");
        filters.set_date_preset(DatePreset::LastDay, NOW);
        filters.set_file_size_range(Some(SizeRange {
            min: None,
            max: Some(1024),
        }));

        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["fileTypes"][0], "pdf");
        assert_eq!(json["datePreset"], "lastDay");
        assert_eq!(json["dateRange"]["end"], NOW);
        assert_eq!(json["fileSizeRange"]["max"], 1024);
        assert!(json["fileSizeRange"].get("min").is_none());

        let empty = serde_json::to_value(SearchFilters::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }

    #[test]
    fn test_size_range_open_bounds() {
        let at_least: SizeRange = serde_json::from_str(r#"{"min":1000}"#).unwrap();
        assert_eq!(at_least.max, None);
        assert!(at_least.contains(1000));
        assert!(at_least.contains(u64::MAX));
        assert!(!at_least.contains(999));

        let at_most = SizeRange {
            min: None,
            max: Some(10),
        };
        assert!(at_most.contains(0));
        assert!(!at_most.contains(11));
        assert!(SizeRange::default().contains(42));
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!("week".parse::<DatePreset>().unwrap(), DatePreset::LastWeek);
        assert_eq!("lastMonth".parse::<DatePreset>().unwrap(), DatePreset::LastMonth);
        assert!("fortnight".parse::<DatePreset>().is_err());
    }
}
