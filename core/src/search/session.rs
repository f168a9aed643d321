//! Search session controller
//!
//! Turns query edits, filter changes and page moves into search requests.
//! Typed text is debounced; filter and page changes search immediately. Every
//! issued request gets a sequence number and only the response to the latest
//! one may change what is displayed.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{DatePreset, PageState, Scheduler, SearchEngine, SearchFilters, SearchHistory, TaskHandle};
use crate::error::LunaryResult;
use crate::types::{SearchRequest, SearchResponse, SearchResult};
use crate::DEFAULT_DEBOUNCE_MS;

const EVENT_CAPACITY: usize = 64;

/// Where the session is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing pending
    #[default]
    Idle,
    /// Waiting for typing to pause
    Debouncing,
    /// A request has been sent
    InFlight,
    /// The latest request completed or failed
    Settled,
}

/// Published whenever displayed state changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Snapshot changed
    Updated,
    /// The latest request failed with this message
    SearchFailed(String),
}

/// Copy of everything a view needs to render the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Text as typed
    pub query: String,
    /// Text of the latest issued request
    pub committed_query: Option<String>,
    pub filters: SearchFilters,
    pub page: PageState,
    pub phase: SessionPhase,
    pub results: Vec<SearchResult>,
    /// Total matches across all pages
    pub total_results: u64,
    /// Wall clock time of the latest request in seconds, three decimals
    pub elapsed: f64,
    pub has_more: bool,
    pub has_next: bool,
    pub has_prev: bool,
    /// Most recent first
    pub history: Vec<String>,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct SessionState {
    query: String,
    committed_query: Option<String>,
    filters: SearchFilters,
    page: PageState,
    phase: SessionPhase,
    results: Vec<SearchResult>,
    total_results: u64,
    elapsed: f64,
    has_more: bool,
    last_error: Option<String>,
    history: SearchHistory,
    /// Sequence number of the newest request; 0 before the first
    latest_issued: u64,
    /// Bumped on every debounce restart so a timer that already fired
    /// cannot commit stale text
    debounce_token: u64,
    pending: Option<TaskHandle>,
}

impl SessionState {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.debounce_token += 1;
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.total_results = 0;
        self.elapsed = 0.0;
        self.has_more = false;
    }

    /// Commit the current text and build the request for it.
    ///
    /// Blank text clears the display and supersedes anything in flight.
    fn commit(&mut self) -> Option<(u64, SearchRequest)> {
        self.cancel_pending();
        self.latest_issued += 1;

        let query = self.query.trim().to_string();
        if query.is_empty() {
            self.committed_query = None;
            self.clear_results();
            self.last_error = None;
            self.phase = SessionPhase::Idle;
            return None;
        }

        self.committed_query = Some(query.clone());
        self.phase = SessionPhase::InFlight;
        let request = SearchRequest {
            query,
            limit: self.page.per_page(),
            offset: self.page.offset(),
            filters: self.filters.clone(),
        };
        Some((self.latest_issued, request))
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            query: self.query.clone(),
            committed_query: self.committed_query.clone(),
            filters: self.filters.clone(),
            page: self.page,
            phase: self.phase,
            results: self.results.clone(),
            total_results: self.total_results,
            elapsed: self.elapsed,
            has_more: self.has_more,
            has_next: self.page.has_next(self.total_results),
            has_prev: self.page.has_prev(),
            history: self.history.entries().to_vec(),
            last_error: self.last_error.clone(),
        }
    }
}

struct Inner {
    engine: Arc<dyn SearchEngine>,
    scheduler: Scheduler,
    debounce: Duration,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Inner {
    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn debounce_elapsed(self: &Arc<Self>, token: u64) {
        let issued = {
            let mut state = self.state.lock();
            if state.debounce_token != token {
                return;
            }
            state.pending = None;
            state.commit()
        };
        self.dispatch(issued);
    }

    fn dispatch(self: &Arc<Self>, issued: Option<(u64, SearchRequest)>) {
        self.publish(SessionEvent::Updated);
        let Some((id, request)) = issued else {
            return;
        };

        debug!(
            "Issuing search #{} for {:?} (offset {}, limit {})",
            id, request.query, request.offset, request.limit
        );
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            let query = request.query.clone();
            let outcome = inner.engine.search_index(request).await;
            inner.apply(id, &query, outcome, started.elapsed());
        });
    }

    fn apply(&self, id: u64, query: &str, outcome: LunaryResult<SearchResponse>, took: Duration) {
        let failure = {
            let mut state = self.state.lock();
            if id != state.latest_issued {
                debug!(
                    "Discarding response #{} superseded by #{}",
                    id, state.latest_issued
                );
                return;
            }

            state.phase = SessionPhase::Settled;
            state.history.record(query);
            match outcome {
                Ok(response) => {
                    state.total_results = response.effective_total();
                    state.has_more = response.has_more;
                    state.results = response.results;
                    state.elapsed = round_millis(took);
                    state.last_error = None;
                    debug!(
                        "Search #{} returned {} of {} results in {:.3}s",
                        id,
                        state.results.len(),
                        state.total_results,
                        state.elapsed
                    );
                    None
                }
                Err(e) => {
                    warn!("Search #{} for {:?} failed: {}", id, query, e);
                    state.clear_results();
                    let message = e.to_string();
                    state.last_error = Some(message.clone());
                    Some(message)
                }
            }
        };

        if let Some(message) = failure {
            self.publish(SessionEvent::SearchFailed(message));
        }
        self.publish(SessionEvent::Updated);
    }
}

fn round_millis(took: Duration) -> f64 {
    (took.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Search session shared between the input handlers and the result view.
///
/// Cloning is cheap; clones drive the same session. Methods that may start a
/// search must be called from within a tokio runtime.
#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<Inner>,
}

impl SearchSession {
    /// Create a session with the default debounce delay
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self::with_debounce(engine, Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    /// Create a session with a custom debounce delay
    pub fn with_debounce(engine: Arc<dyn SearchEngine>, debounce: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                engine,
                scheduler: Scheduler,
                debounce,
                state: Mutex::new(SessionState::default()),
                events,
            }),
        }
    }

    /// Listen for state changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Record an edit of the query text.
    ///
    /// Non-blank text is searched once typing pauses for the debounce delay.
    /// Blank text clears the results right away.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.inner.state.lock();
        state.query = text;

        if state.query.trim().is_empty() {
            let issued = state.commit();
            drop(state);
            self.inner.dispatch(issued);
            return;
        }

        state.cancel_pending();
        let token = state.debounce_token;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state.pending = Some(self.inner.scheduler.schedule(self.inner.debounce, move || {
            if let Some(inner) = weak.upgrade() {
                inner.debounce_elapsed(token);
            }
        }));
        state.phase = SessionPhase::Debouncing;
        drop(state);
        self.inner.publish(SessionEvent::Updated);
    }

    /// Search the current text now, skipping the debounce delay
    pub fn submit(&self) {
        let issued = {
            let mut state = self.inner.state.lock();
            state.page.reset();
            state.commit()
        };
        self.inner.dispatch(issued);
    }

    /// Re-run a remembered query
    pub fn select_history(&self, text: &str) {
        self.inner.state.lock().query = text.to_string();
        self.submit();
    }

    /// Replace all filters and search again from page 1
    pub fn set_filters(&self, filters: SearchFilters) {
        self.refine(|state| {
            state.filters = filters;
            state.page.reset();
            true
        });
    }

    /// Select a date preset relative to now
    pub fn apply_date_preset(&self, preset: DatePreset) {
        let now = crate::now_millis();
        self.refine(|state| {
            state.filters.set_date_preset(preset, now);
            state.page.reset();
            true
        });
    }

    /// Flip one file type filter. Returns `true` if it is now selected.
    pub fn toggle_file_type(&self, file_type: &str) -> bool {
        let mut selected = false;
        self.refine(|state| {
            selected = state.filters.toggle_file_type(file_type);
            state.page.reset();
            true
        });
        selected
    }

    /// Drop every filter
    pub fn clear_filters(&self) {
        self.refine(|state| {
            if state.filters.is_empty() && state.filters.date_preset.is_none() {
                return false;
            }
            state.filters.clear();
            state.page.reset();
            true
        });
    }

    /// Change the page size; goes back to page 1
    pub fn set_per_page(&self, per_page: u32) -> LunaryResult<()> {
        let mut result = Ok(());
        self.refine(|state| {
            if state.page.per_page() == per_page {
                return false;
            }
            result = state.page.set_per_page(per_page);
            result.is_ok()
        });
        result
    }

    /// Go to the next page. Returns `false` on the last page.
    pub fn next_page(&self) -> bool {
        self.refine(|state| {
            let total = state.total_results;
            state.page.next(total)
        })
    }

    /// Go to the previous page. Returns `false` on page 1.
    pub fn prev_page(&self) -> bool {
        self.refine(|state| state.page.prev())
    }

    /// Jump to a page within the current results
    pub fn goto_page(&self, page: u32) -> bool {
        self.refine(|state| {
            let total = state.total_results;
            state.page.goto(page, total)
        })
    }

    /// Session history, most recent first
    pub fn history(&self) -> Vec<String> {
        self.inner.state.lock().history.entries().to_vec()
    }

    /// Forget one remembered query
    pub fn remove_history(&self, text: &str) -> bool {
        let removed = self.inner.state.lock().history.remove(text);
        if removed {
            self.inner.publish(SessionEvent::Updated);
        }
        removed
    }

    /// Forget all remembered queries
    pub fn clear_history(&self) {
        self.inner.state.lock().history.clear();
        self.inner.publish(SessionEvent::Updated);
    }

    /// Cancel a pending debounce. A request already sent still completes.
    pub fn shutdown(&self) {
        self.inner.state.lock().cancel_pending();
        info!("Search session shut down");
    }

    /// Apply a filter or page change. Searches immediately when there is
    /// text to search; a pending debounce is folded into that request.
    fn refine<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut SessionState) -> bool,
    {
        let issued = {
            let mut state = self.inner.state.lock();
            if !change(&mut state) {
                return false;
            }
            if state.query.trim().is_empty() {
                None
            } else {
                state.commit()
            }
        };
        self.inner.dispatch(issued);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::MockSearchEngine;
    use super::*;
    use crate::error::LunaryError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Engine that answers after a per-query delay and records every request
    #[derive(Default)]
    struct FakeEngine {
        requests: Mutex<Vec<SearchRequest>>,
        delays: HashMap<String, u64>,
        total: Option<u64>,
    }

    impl FakeEngine {
        fn with_delays(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays.iter().map(|(q, ms)| (q.to_string(), *ms)).collect(),
                total: Some(42),
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<SearchRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl SearchEngine for FakeEngine {
        async fn search_index(&self, request: SearchRequest) -> LunaryResult<SearchResponse> {
            self.requests.lock().push(request.clone());
            let delay = self.delays.get(&request.query).copied().unwrap_or(10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(SearchResponse {
                results: vec![hit(&request.query), hit(&request.query)],
                total_count: self.total,
                search_time: 0.01,
                has_more: true,
            })
        }
    }

    fn hit(query: &str) -> SearchResult {
        SearchResult {
            id: format!("{}-hit", query),
            title: query.to_string(),
            content: format!("... {} ...", query),
            file_path: format!("/docs/{}.md", query),
            file_type: "md".to_string(),
            modified_time: 0,
            score: 0.9,
            highlights: vec![format!("<mark>{}</mark>", query)],
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_issue_one_request() {
        let engine = Arc::new(FakeEngine::with_delays(&[]));
        let session = SearchSession::new(engine.clone());

        session.set_query("r");
        tokio::time::sleep(ms(100)).await;
        session.set_query("ru");
        tokio::time::sleep(ms(100)).await;
        session.set_query("rust");
        assert_eq!(session.snapshot().phase, SessionPhase::Debouncing);

        tokio::time::sleep(ms(299)).await;
        assert!(engine.requests().is_empty());

        tokio::time::sleep(ms(50)).await;
        let requests = engine.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "rust");
        assert_eq!(requests[0].offset, 0);
        assert_eq!(requests[0].limit, 20);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Settled);
        assert_eq!(snapshot.results[0].title, "rust");
        assert_eq!(snapshot.total_results, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let engine = Arc::new(FakeEngine::with_delays(&[("slow", 500), ("fast", 20)]));
        let session = SearchSession::new(engine.clone());

        session.set_query("slow");
        session.submit();
        tokio::time::sleep(ms(10)).await;
        session.set_query("fast");
        session.submit();

        tokio::time::sleep(ms(100)).await;
        assert_eq!(session.snapshot().results[0].title, "fast");

        tokio::time::sleep(ms(1000)).await;
        let snapshot = session.snapshot();
        assert_eq!(engine.requests().len(), 2);
        assert_eq!(snapshot.results[0].title, "fast");
        assert_eq!(snapshot.committed_query.as_deref(), Some("fast"));
        assert_eq!(snapshot.history, vec!["fast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_without_engine() {
        let mut engine = MockSearchEngine::new();
        engine.expect_search_index().never();
        let session = SearchSession::new(Arc::new(engine));

        session.set_query("   ");
        session.submit();
        tokio::time::sleep(ms(1000)).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Idle);
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.total_results, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_text_supersedes_in_flight_request() {
        let engine = Arc::new(FakeEngine::with_delays(&[("slow", 500)]));
        let session = SearchSession::new(engine.clone());

        session.set_query("slow");
        session.submit();
        tokio::time::sleep(ms(10)).await;
        session.set_query("");

        tokio::time::sleep(ms(1000)).await;
        let snapshot = session.snapshot();
        assert_eq!(engine.requests().len(), 1);
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.phase, SessionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_failure_resets_display() {
        let mut engine = MockSearchEngine::new();
        engine
            .expect_search_index()
            .times(1)
            .returning(|_| Err(LunaryError::search_engine("index offline")));
        let session = SearchSession::new(Arc::new(engine));
        let mut events = session.subscribe();

        session.set_query("report");
        session.submit();
        tokio::time::sleep(ms(10)).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Settled);
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.total_results, 0);
        assert_eq!(snapshot.elapsed, 0.0);
        assert_eq!(snapshot.history, vec!["report"]);
        assert!(snapshot.last_error.unwrap().contains("index offline"));

        let mut failed = false;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::SearchFailed(message) = event {
                assert!(message.contains("index offline"));
                failed = true;
            }
        }
        assert!(failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_total_falls_back_to_page_length() {
        let engine = Arc::new(FakeEngine {
            total: None,
            ..Default::default()
        });
        let session = SearchSession::new(engine);

        session.set_query("x");
        session.submit();
        tokio::time::sleep(ms(50)).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.total_results, 2);
        assert!(!snapshot.has_next);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_rounded_to_millis() {
        let engine = Arc::new(FakeEngine::with_delays(&[("q", 1234)]));
        let session = SearchSession::new(engine);

        session.set_query("q");
        session.submit();
        tokio::time::sleep(ms(2000)).await;

        assert_eq!(session.snapshot().elapsed, 1.234);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_searches_immediately() {
        let engine = Arc::new(FakeEngine::with_delays(&[]));
        let session = SearchSession::new(engine.clone());

        session.set_query("doc");
        assert!(session.toggle_file_type("pdf"));

        tokio::time::sleep(ms(5)).await;
        let requests = engine.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "doc");
        assert!(requests[0].filters.accepts_file_type("pdf"));
        assert!(!requests[0].filters.accepts_file_type("txt"));

        // the cancelled debounce never fires a second request
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(engine.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_without_text_does_not_search() {
        let mut engine = MockSearchEngine::new();
        engine.expect_search_index().never();
        let session = SearchSession::new(Arc::new(engine));

        session.apply_date_preset(DatePreset::LastWeek);
        tokio::time::sleep(ms(1000)).await;

        let filters = session.snapshot().filters;
        assert_eq!(filters.date_preset, Some(DatePreset::LastWeek));
        let range = filters.date_range.unwrap();
        assert_eq!(range.end.unwrap() - range.start.unwrap(), 604_800_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_requests() {
        let engine = Arc::new(FakeEngine::with_delays(&[]));
        let session = SearchSession::new(engine.clone());

        session.set_query("rust");
        session.submit();
        tokio::time::sleep(ms(50)).await;
        assert!(session.snapshot().has_next);
        assert!(!session.snapshot().has_prev);

        assert!(session.next_page());
        tokio::time::sleep(ms(50)).await;
        assert!(session.next_page());
        tokio::time::sleep(ms(50)).await;
        // 42 results at 20 per page fill three pages
        assert!(!session.next_page());
        assert_eq!(session.snapshot().page.page(), 3);
        assert!(session.snapshot().has_prev);

        session.set_per_page(50).unwrap();
        tokio::time::sleep(ms(50)).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.page.page(), 1);
        assert!(!snapshot.has_next);

        assert!(session.set_per_page(7).is_err());

        let offsets: Vec<(u64, u32)> = engine
            .requests()
            .iter()
            .map(|r| (r.offset, r.limit))
            .collect();
        assert_eq!(offsets, vec![(0, 20), (20, 20), (40, 20), (0, 50)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_history_resubmits() {
        let engine = Arc::new(FakeEngine::with_delays(&[]));
        let session = SearchSession::new(engine.clone());

        for query in ["alpha", "beta"] {
            session.set_query(query);
            session.submit();
            tokio::time::sleep(ms(50)).await;
        }
        assert_eq!(session.history(), vec!["beta", "alpha"]);

        session.select_history("alpha");
        tokio::time::sleep(ms(50)).await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.query, "alpha");
        assert_eq!(snapshot.results[0].title, "alpha");
        assert_eq!(snapshot.history, vec!["beta", "alpha"]);

        assert!(session.remove_history("beta"));
        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_debounce() {
        let mut engine = MockSearchEngine::new();
        engine.expect_search_index().never();
        let session = SearchSession::new(Arc::new(engine));

        session.set_query("pending");
        session.shutdown();
        tokio::time::sleep(ms(1000)).await;
        assert!(session.snapshot().committed_query.is_none());
    }
}
