//! Console rendering

use chrono::{TimeZone, Utc};
use lunary_core::{AppSettings, DirectoryConfig, IndexStatus, SessionSnapshot};
use lunary_theming::PresentationSink;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};

/// Presentation sink for a terminal: remembers the mode and announces changes
#[derive(Default)]
pub struct ConsoleSink {
    dark: AtomicBool,
}

impl ConsoleSink {
    pub fn is_dark(&self) -> bool {
        self.dark.load(Ordering::Relaxed)
    }
}

impl PresentationSink for ConsoleSink {
    fn apply(&self, dark: bool) {
        let previous = self.dark.swap(dark, Ordering::Relaxed);
        if previous != dark {
            println!("(appearance: {})", if dark { "dark" } else { "light" });
        }
    }
}

/// Replace `<mark>` tags with brackets and drop any other markup
pub fn plain_highlight(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match &rest[open..open + close + 1] {
            "<mark>" => out.push('['),
            "</mark>" => out.push(']'),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

/// Format epoch milliseconds as a UTC date, or "never" for 0
pub fn format_time(millis: i64) -> String {
    if millis == 0 {
        return "never".to_string();
    }
    match Utc.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => "invalid date".to_string(),
    }
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn render_results(snapshot: &SessionSnapshot, highlighting: bool) -> String {
    let mut out = String::new();
    let query = snapshot.committed_query.as_deref().unwrap_or_default();
    if snapshot.results.is_empty() {
        let _ = writeln!(out, "No results for {:?}", query);
        return out;
    }

    let _ = writeln!(
        out,
        "{} results for {:?} ({:.3}s), page {} of {}",
        snapshot.total_results,
        query,
        snapshot.elapsed,
        snapshot.page.page(),
        snapshot.page.page_count(snapshot.total_results).max(1)
    );
    for (i, result) in snapshot.results.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} [{}] {:.0}%",
            i + 1,
            result.title,
            result.file_type,
            result.score * 100.0
        );
        let _ = writeln!(out, "     {}", result.file_path);
        match result.highlights.first() {
            Some(fragment) if highlighting => {
                let _ = writeln!(out, "     {}", plain_highlight(fragment));
            }
            _ => {
                let _ = writeln!(out, "     {}", result.content);
            }
        }
    }

    let mut nav = Vec::new();
    if snapshot.has_prev {
        nav.push(":prev");
    }
    if snapshot.has_next {
        nav.push(":next");
    }
    if !nav.is_empty() {
        let _ = writeln!(out, "({})", nav.join(" | "));
    }
    out
}

pub fn render_history(history: &[String]) -> String {
    if history.is_empty() {
        return "No recent searches\n".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{:>3}. {}\n", i + 1, text))
        .collect()
}

pub fn render_directories(directories: &[DirectoryConfig]) -> String {
    if directories.is_empty() {
        return "No watched folders (add one with :add PATH)\n".to_string();
    }
    let mut out = String::new();
    for dir in directories {
        let _ = writeln!(
            out,
            "[{}] {}{}  last indexed: {}",
            if dir.enabled { "x" } else { " " },
            dir.path,
            if dir.recursive { " (recursive)" } else { "" },
            format_time(dir.last_indexed)
        );
    }
    out
}

pub fn render_status(status: &IndexStatus) -> String {
    let state = if status.is_indexing {
        format!("indexing {}%", status.progress)
    } else {
        "idle".to_string()
    };
    format!(
        "Index: {}\n  files: {} / {}\n  size: {}\n  updated: {}\n",
        state,
        status.indexed_files,
        status.total_files,
        format_size(status.index_size),
        format_time(status.last_updated)
    )
}

pub fn render_settings(settings: &AppSettings) -> String {
    match serde_json::to_string_pretty(settings) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("Cannot display settings: {}\n", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_highlight() {
        assert_eq!(
            plain_highlight("see <mark>rust</mark> <b>now</b>"),
            "see [rust] now"
        );
        assert_eq!(plain_highlight("a < b"), "a < b");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(156 * 1024 * 1024), "156.0 MB");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "never");
        assert_eq!(format_time(1_700_000_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn test_render_directories() {
        let mut dir = DirectoryConfig::new("/docs");
        dir.enabled = false;
        let out = render_directories(&[dir]);
        assert!(out.starts_with("[ ] /docs (recursive)"));
        assert!(out.contains("never"));
    }

    #[test]
    fn test_console_sink_tracks_mode() {
        let sink = ConsoleSink::default();
        sink.apply(true);
        assert!(sink.is_dark());
        sink.apply(false);
        assert!(!sink.is_dark());
    }
}
