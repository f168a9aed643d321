//! Core types exchanged with the search engine and persisted between sessions

use serde::{Deserialize, Serialize};

use crate::search::SearchFilters;

/// One hit returned by the search engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    /// Content snippet
    pub content: String,
    pub file_path: String,
    pub file_type: String,
    /// Last modification time (epoch milliseconds)
    pub modified_time: i64,
    /// Relevance in `[0, 1]`
    pub score: f32,
    /// Marked-up fragments; escaping is left to whoever renders them
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Request sent to the search engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub limit: u32,
    pub offset: u64,
    pub filters: SearchFilters,
}

/// Response returned by the search engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Total matches across all pages; may be missing or zero
    pub total_count: Option<u64>,
    /// Engine-reported search time in seconds
    pub search_time: f64,
    pub has_more: bool,
}

impl SearchResponse {
    /// Total to display: the engine's count when it reports a non-zero one,
    /// otherwise the number of results in this page.
    pub fn effective_total(&self) -> u64 {
        match self.total_count {
            Some(total) if total > 0 => total,
            _ => self.results.len() as u64,
        }
    }
}

/// One watched folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Absolute path, unique within the list
    pub path: String,
    pub enabled: bool,
    /// Descend into sub-directories
    pub recursive: bool,
    /// Last indexing time (epoch milliseconds), `0` for never
    #[serde(default)]
    pub last_indexed: i64,
}

impl DirectoryConfig {
    /// Create an entry for a newly added folder
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
            recursive: true,
            last_indexed: 0,
        }
    }

    /// Check if this folder has ever been indexed
    pub fn was_indexed(&self) -> bool {
        self.last_indexed > 0
    }
}

/// Snapshot of indexing progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexStatus {
    pub is_indexing: bool,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub total_files: u64,
    pub indexed_files: u64,
    /// Index size on disk (bytes)
    pub index_size: u64,
    /// Epoch milliseconds
    pub last_updated: i64,
}

impl IndexStatus {
    /// Return a copy with `indexed_files <= total_files` and `progress <= 100`
    pub fn normalized(&self) -> Self {
        Self {
            progress: self.progress.min(100),
            indexed_files: self.indexed_files.min(self.total_files),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: format!("{}.md", id),
            content: String::new(),
            file_path: format!("/docs/{}.md", id),
            file_type: "md".to_string(),
            modified_time: 0,
            score: 0.5,
            highlights: vec![],
        }
    }

    #[test]
    fn test_effective_total_prefers_engine_count() {
        let response = SearchResponse {
            results: vec![result("a"), result("b")],
            total_count: Some(40),
            ..Default::default()
        };
        assert_eq!(response.effective_total(), 40);
    }

    #[test]
    fn test_effective_total_falls_back_to_page_length() {
        let mut response = SearchResponse {
            results: vec![result("a"), result("b")],
            total_count: Some(0),
            ..Default::default()
        };
        assert_eq!(response.effective_total(), 2);

        response.total_count = None;
        assert_eq!(response.effective_total(), 2);
    }

    #[test]
    fn test_response_without_total_count_decodes() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"results":[{"id":"1","title":"t","content":"c","filePath":"/t","fileType":"txt","modifiedTime":5,"score":0.9}]}"#,
        )
        .unwrap();
        assert_eq!(response.total_count, None);
        assert_eq!(response.results[0].file_path, "/t");
        assert!(response.results[0].highlights.is_empty());
    }

    #[test]
    fn test_new_directory_defaults() {
        let dir = DirectoryConfig::new("/x");
        assert!(dir.enabled);
        assert!(dir.recursive);
        assert_eq!(dir.last_indexed, 0);
        assert!(!dir.was_indexed());
    }

    #[test]
    fn test_index_status_normalized() {
        let status = IndexStatus {
            progress: 120,
            total_files: 10,
            indexed_files: 15,
            ..Default::default()
        };
        let status = status.normalized();
        assert_eq!(status.progress, 100);
        assert_eq!(status.indexed_files, 10);
    }
}
