//! Recently issued queries

use crate::SEARCH_HISTORY_LIMIT;

/// Unique queries, most recent first, capped in length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
    limit: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::with_limit(SEARCH_HISTORY_LIMIT)
    }
}

impl SearchHistory {
    /// Create an empty history keeping at most `limit` entries
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Remember a query.
    ///
    /// A query already present keeps its position. Returns `true` if the
    /// entry was added.
    pub fn record(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.contains(text) {
            return false;
        }
        self.entries.insert(0, text.to_string());
        self.entries.truncate(self.limit);
        true
    }

    /// Forget one query. Returns `true` if it was present.
    pub fn remove(&mut self, text: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != text);
        self.entries.len() != before
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|entry| entry == text)
    }

    /// Entries, most recent first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_prepends() {
        let mut history = SearchHistory::default();
        history.record("alpha");
        history.record("beta");
        assert_eq!(history.entries(), &["beta", "alpha"]);
    }

    #[test]
    fn test_repeat_keeps_position() {
        let mut history = SearchHistory::default();
        history.record("alpha");
        history.record("beta");
        assert!(!history.record("alpha"));
        assert_eq!(history.entries(), &["beta", "alpha"]);
    }

    #[test]
    fn test_capped_at_limit() {
        let mut history = SearchHistory::default();
        for i in 0..25 {
            history.record(&format!("query {}", i));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0], "query 24");
        assert_eq!(history.entries()[9], "query 15");
    }

    #[test]
    fn test_blank_is_ignored() {
        let mut history = SearchHistory::default();
        assert!(!history.record("   "));
        assert!(history.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut history = SearchHistory::default();
        history.record("a");
        history.record("b");
        assert!(history.remove("a"));
        assert!(!history.remove("a"));
        assert_eq!(history.entries(), &["b"]);

        history.clear();
        assert!(history.is_empty());
    }
}
