//! Search overlay controller.
//!
//! Owns a debounced, cancellable query-to-results pipeline that is
//! fully independent of the feed's pagination state. Results are
//! never written back into the feed.

use crate::config::EngineConfig;
use parking_lot::Mutex;
use rankfeed_api::{RankedUser, RankingClient};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The current status of the search overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// No query, or query below the minimum length.
    Idle,
    /// Waiting out the debounce delay after the last keystroke.
    Debouncing,
    /// A search request is in flight.
    Loading,
    /// The last search completed with results.
    Ready,
    /// The last search completed with zero results (valid, not an error).
    Empty,
    /// The last search failed.
    Error,
}

/// Read-only snapshot of the search overlay.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    /// The raw query as typed.
    pub query: String,
    /// The query the displayed results belong to.
    pub debounced_query: String,
    /// Current results, in service-provided rank order.
    pub results: Vec<RankedUser>,
    /// Current status.
    pub status: SearchStatus,
    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,
    /// Whether the overlay should own the rendered view.
    pub is_active: bool,
}

impl SearchSnapshot {
    /// True while debouncing or a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, SearchStatus::Debouncing | SearchStatus::Loading)
    }

    /// True if the last search failed.
    pub fn is_error(&self) -> bool {
        self.status == SearchStatus::Error
    }
}

struct SearchInner {
    query: String,
    debounced_query: String,
    results: Vec<RankedUser>,
    status: SearchStatus,
    last_error: Option<String>,
}

struct SearchShared<C: RankingClient> {
    client: Arc<C>,
    config: EngineConfig,
    inner: Mutex<SearchInner>,
    /// Staleness token: bumped on every keystroke. A debounce firing
    /// or a request completion is applied only if its token is still
    /// current, so superseded results are never displayed.
    generation: AtomicU64,
    debounce_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: RankingClient> SearchShared<C> {
    async fn run_query(&self, token: u64, query: String) {
        {
            let mut inner = self.inner.lock();
            if self.generation.load(Ordering::SeqCst) != token {
                return;
            }
            inner.debounced_query = query.clone();
            inner.status = SearchStatus::Loading;
        }

        let result = self.client.search_users(&query).await;
        let mut inner = self.inner.lock();
        if self.generation.load(Ordering::SeqCst) != token {
            debug!(%query, "discarding stale search result");
            return;
        }
        match result {
            Ok(users) => {
                debug!(%query, results = users.len(), "search completed");
                inner.status = if users.is_empty() {
                    SearchStatus::Empty
                } else {
                    SearchStatus::Ready
                };
                inner.results = users;
                inner.last_error = None;
            }
            Err(error) => {
                warn!(%query, %error, "search failed");
                inner.status = SearchStatus::Error;
                inner.results.clear();
                inner.last_error = Some(error.to_string());
            }
        }
    }
}

/// The search overlay controller.
///
/// Classic trailing-edge debounce: each keystroke aborts the pending
/// debounce timer and starts a new one; only the request for the
/// latest debounced query is honored. There is no true cancellation
/// of in-flight requests — supersession is emulated by discarding
/// stale completions via the generation token.
pub struct SearchController<C: RankingClient> {
    shared: Arc<SearchShared<C>>,
}

impl<C: RankingClient> SearchController<C> {
    /// Creates a search controller in the idle state.
    pub fn new(client: Arc<C>, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(SearchShared {
                client,
                config,
                inner: Mutex::new(SearchInner {
                    query: String::new(),
                    debounced_query: String::new(),
                    results: Vec::new(),
                    status: SearchStatus::Idle,
                    last_error: None,
                }),
                generation: AtomicU64::new(0),
                debounce_task: Mutex::new(None),
            }),
        }
    }

    /// Records a keystroke.
    ///
    /// Below the minimum length the overlay is forced to idle with
    /// empty results and no request is issued, regardless of previous
    /// state. At or above it, the debounce timer restarts and a
    /// request for this query is issued once the delay elapses
    /// without another keystroke.
    pub fn set_query(&self, query: &str) {
        let shared = &self.shared;
        if let Some(task) = shared.debounce_task.lock().take() {
            task.abort();
        }
        let token = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut inner = shared.inner.lock();
        inner.query = query.to_string();
        if query.chars().count() < shared.config.min_query_len {
            inner.debounced_query.clear();
            inner.results.clear();
            inner.status = SearchStatus::Idle;
            inner.last_error = None;
            return;
        }
        inner.status = SearchStatus::Debouncing;
        drop(inner);

        let shared = Arc::clone(&self.shared);
        let query = query.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(shared.config.search_debounce).await;
            shared.run_query(token, query).await;
        });
        *self.shared.debounce_task.lock() = Some(handle);
    }

    /// Returns a read-only snapshot of the overlay state.
    pub fn snapshot(&self) -> SearchSnapshot {
        let inner = self.shared.inner.lock();
        SearchSnapshot {
            query: inner.query.clone(),
            debounced_query: inner.debounced_query.clone(),
            results: inner.results.clone(),
            status: inner.status,
            last_error: inner.last_error.clone(),
            is_active: inner.query.chars().count() >= self.shared.config.min_query_len,
        }
    }

    /// Aborts the pending debounce and invalidates in-flight
    /// completions.
    pub fn shutdown(&self) {
        if let Some(task) = self.shared.debounce_task.lock().take() {
            task.abort();
        }
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl<C: RankingClient> Drop for SearchController<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
