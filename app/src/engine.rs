//! Search engines available to the shell

use async_trait::async_trait;
use lunary_core::search::{DAY_MS, KNOWN_FILE_TYPES};
use lunary_core::{
    LunaryError, LunaryResult, SearchEngine, SearchRequest, SearchResponse, SearchResult,
};
use std::time::Duration;
use tracing::debug;

/// Document in the demo corpus
#[derive(Debug, Clone)]
struct DemoDocument {
    title: String,
    content: String,
    file_path: String,
    file_type: String,
    modified_time: i64,
    size: u64,
}

/// In-memory engine over a generated corpus, used with `--demo`
pub struct DemoEngine {
    documents: Vec<DemoDocument>,
    latency: Duration,
}

const TOPICS: [(&str, &str); 8] = [
    ("Quarterly report", "Revenue grew in every region; this report covers the new index format."),
    ("Meeting notes", "Discussed the release plan, the rust rewrite and the onboarding checklist."),
    ("Project proposal", "A proposal for a desktop search tool with instant results and filters."),
    ("Budget overview", "Spending by department with a forecast for the next quarter."),
    ("Travel itinerary", "Flights, hotel and the conference schedule for the autumn summit."),
    ("Research paper", "Inverted indexes, ranking functions and query latency measurements."),
    ("Recipe collection", "Bread, soup and a rust-coloured pumpkin pie for the holidays."),
    ("Release checklist", "Tag the build, update the changelog, publish the report."),
];

impl DemoEngine {
    /// Build the corpus relative to `now` (epoch milliseconds)
    pub fn new(now: i64) -> Self {
        let mut documents = Vec::new();
        for (i, (title, content)) in TOPICS.iter().enumerate() {
            for (j, file_type) in KNOWN_FILE_TYPES.iter().enumerate() {
                let n = i * KNOWN_FILE_TYPES.len() + j;
                documents.push(DemoDocument {
                    title: format!("{} {}", title, j + 1),
                    content: content.to_string(),
                    file_path: format!(
                        "/home/demo/Documents/{}-{}.{}",
                        title.to_lowercase().replace(' ', "-"),
                        j + 1,
                        file_type
                    ),
                    file_type: file_type.to_string(),
                    // Spread over roughly two months
                    modified_time: now - (n as i64 % 60) * DAY_MS,
                    size: 4096 * (n as u64 + 1),
                });
            }
        }

        Self {
            documents,
            latency: Duration::from_millis(120),
        }
    }

    /// Override the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn score(document: &DemoDocument, terms: &[String]) -> Option<f32> {
        let title = document.title.to_lowercase();
        let content = document.content.to_lowercase();
        let mut score = 0.0;
        for term in terms {
            let in_title = title.contains(term.as_str());
            let in_content = content.contains(term.as_str());
            if !in_title && !in_content {
                return None;
            }
            score += if in_title { 1.0 } else { 0.5 };
        }
        Some((score / terms.len() as f32).min(1.0))
    }
}

/// Wrap every occurrence of a term in `<mark>` tags
fn highlight(text: &str, terms: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    // Lowercasing may change byte offsets for non-ASCII text
    if lower.len() != text.len() {
        return None;
    }

    let mut marks: Vec<(usize, usize)> = Vec::new();
    for term in terms {
        let mut from = 0;
        while let Some(pos) = lower[from..].find(term.as_str()) {
            let start = from + pos;
            marks.push((start, start + term.len()));
            from = start + term.len();
        }
    }
    if marks.is_empty() {
        return None;
    }
    marks.sort_unstable();

    let mut out = String::with_capacity(text.len() + marks.len() * 13);
    let mut cursor = 0;
    for (start, end) in marks {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str("<mark>");
        out.push_str(&text[start..end]);
        out.push_str("</mark>");
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Some(out)
}

#[async_trait]
impl SearchEngine for DemoEngine {
    async fn search_index(&self, request: SearchRequest) -> LunaryResult<SearchResponse> {
        tokio::time::sleep(self.latency).await;

        let terms: Vec<String> = request
            .query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return Ok(SearchResponse::default());
        }

        let filters = &request.filters;
        let mut hits: Vec<(f32, &DemoDocument)> = self
            .documents
            .iter()
            .filter(|doc| filters.accepts_file_type(&doc.file_type))
            .filter(|doc| filters.date_range.map_or(true, |r| r.contains(doc.modified_time)))
            .filter(|doc| filters.file_size_range.map_or(true, |r| r.contains(doc.size)))
            .filter_map(|doc| Self::score(doc, &terms).map(|score| (score, doc)))
            .collect();
        hits.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.title.cmp(&b.1.title)));

        let total = hits.len() as u64;
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let results: Vec<SearchResult> = hits
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .map(|(score, doc)| SearchResult {
                id: doc.file_path.clone(),
                title: doc.title.clone(),
                content: doc.content.clone(),
                file_path: doc.file_path.clone(),
                file_type: doc.file_type.clone(),
                modified_time: doc.modified_time,
                score,
                highlights: highlight(&doc.content, &terms).into_iter().collect(),
            })
            .collect();

        let has_more = request.offset + (results.len() as u64) < total;
        debug!("Demo engine matched {} documents for {:?}", total, request.query);
        Ok(SearchResponse {
            results,
            total_count: Some(total),
            search_time: self.latency.as_secs_f64(),
            has_more,
        })
    }
}

/// Engine used when no index is connected
pub struct UnavailableEngine;

#[async_trait]
impl SearchEngine for UnavailableEngine {
    async fn search_index(&self, _request: SearchRequest) -> LunaryResult<SearchResponse> {
        Err(LunaryError::search_engine(
            "no search engine connected (run with --demo for sample data)",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunary_core::search::DatePreset;
    use lunary_core::SearchFilters;

    const NOW: i64 = 1_700_000_000_000;

    fn request(query: &str, filters: SearchFilters) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            limit: 10,
            offset: 0,
            filters,
        }
    }

    fn engine() -> DemoEngine {
        DemoEngine::new(NOW).with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_matches_all_terms() {
        let response = engine()
            .search_index(request("rust report", SearchFilters::default()))
            .await
            .unwrap();
        assert_eq!(response.total_count, Some(0));

        let response = engine()
            .search_index(request("report", SearchFilters::default()))
            .await
            .unwrap();
        assert!(response.total_count.unwrap() > 0);
        assert!(response.results[0].title.starts_with("Quarterly report"));
        assert!(response.results[0].highlights[0].contains("<mark>report</mark>"));
    }

    #[tokio::test]
    async fn test_applies_filters_and_pages() {
        let mut filters = SearchFilters::default();
        filters.toggle_file_type("pdf");
        let response = engine().search_index(request("the", filters)).await.unwrap();
        assert!(response.results.iter().all(|r| r.file_type == "pdf"));

        let mut filters = SearchFilters::default();
        filters.set_date_preset(DatePreset::LastDay, NOW);
        let response = engine().search_index(request("the", filters)).await.unwrap();
        assert!(response.results.iter().all(|r| r.modified_time >= NOW - DAY_MS));

        let mut req = request("the", SearchFilters::default());
        req.limit = 5;
        let first = engine().search_index(req.clone()).await.unwrap();
        req.offset = 5;
        let second = engine().search_index(req).await.unwrap();
        assert!(first.has_more);
        assert_ne!(first.results[0].id, second.results[0].id);
    }

    #[test]
    fn test_highlight_marks_every_occurrence() {
        let terms = vec!["the".to_string()];
        assert_eq!(
            highlight("The cat and the hat", &terms).unwrap(),
            "<mark>The</mark> cat and <mark>the</mark> hat"
        );
        assert!(highlight("nothing here", &["zzz".to_string()]).is_none());
    }

    #[tokio::test]
    async fn test_unavailable_engine_fails() {
        let err = UnavailableEngine
            .search_index(request("x", SearchFilters::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, LunaryError::SearchEngine(_)));
    }
}
