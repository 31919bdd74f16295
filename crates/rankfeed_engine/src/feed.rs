//! Paginated feed controller.
//!
//! Owns the growing, ordered collection of ranked records fetched
//! page-by-page, and the periodic refresh-from-top that absorbs
//! upstream rank changes without losing scroll continuity.

use crate::config::EngineConfig;
use crate::lifecycle::LifecycleGate;
use parking_lot::Mutex;
use rankfeed_api::{LeaderboardPage, RankedUser, RankingClient};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// The current status of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing fetched yet.
    Empty,
    /// First page in flight.
    LoadingInitial,
    /// Accumulated pages are current; more can be requested.
    Ready,
    /// A trailing page request is in flight.
    LoadingMore,
    /// A refresh-from-top is in flight.
    Refreshing,
    /// The most recent request failed.
    ///
    /// Recoverable: the next refresh tick or an explicit
    /// [`FeedController::load_initial`] restarts from the top.
    Error,
}

/// Read-only snapshot of the feed handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    /// Accumulated records, deduplicated by username, in fetch order.
    pub records: Vec<RankedUser>,
    /// Current status.
    pub status: FeedStatus,
    /// Whether more records exist past the accumulated sequence.
    pub has_more: bool,
    /// Offset the next load-more would fetch.
    pub next_offset: u64,
    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    /// True while the whole view is loading (initial load or refresh).
    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            FeedStatus::Empty | FeedStatus::LoadingInitial | FeedStatus::Refreshing
        )
    }

    /// True while a trailing page request is in flight.
    pub fn is_loading_more(&self) -> bool {
        self.status == FeedStatus::LoadingMore
    }

    /// True if the most recent request failed.
    pub fn is_error(&self) -> bool {
        self.status == FeedStatus::Error
    }
}

struct FeedInner {
    records: Vec<RankedUser>,
    status: FeedStatus,
    next_offset: u64,
    has_more: bool,
    last_error: Option<String>,
    /// Refresh result that completed while a load-more was in flight;
    /// applied immediately after the load-more resolves.
    parked_refresh: Option<LeaderboardPage>,
    refresh_inflight: bool,
}

struct FeedShared<C: RankingClient> {
    client: Arc<C>,
    gate: Arc<LifecycleGate>,
    config: EngineConfig,
    inner: Mutex<FeedInner>,
}

impl<C: RankingClient> FeedShared<C> {
    async fn load_initial(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if !matches!(inner.status, FeedStatus::Empty | FeedStatus::Error) {
                return false;
            }
            inner.status = FeedStatus::LoadingInitial;
        }

        let result = self.client.fetch_page(self.config.page_size, 0).await;
        let mut inner = self.inner.lock();
        match result {
            Ok(page) => {
                debug!(records = page.users.len(), "initial page loaded");
                apply_replacement(&mut inner, page);
            }
            Err(error) => {
                warn!(%error, "initial load failed");
                inner.status = FeedStatus::Error;
                inner.last_error = Some(error.to_string());
            }
        }
        true
    }

    async fn load_more(&self) -> bool {
        let offset = {
            let mut inner = self.inner.lock();
            if inner.status != FeedStatus::Ready || !inner.has_more {
                return false;
            }
            inner.status = FeedStatus::LoadingMore;
            inner.next_offset
        };

        let result = self.client.fetch_page(self.config.page_size, offset).await;
        let mut inner = self.inner.lock();
        match result {
            Ok(page) => {
                debug!(offset, records = page.users.len(), "page appended");
                inner.next_offset += page.users.len() as u64;
                inner.has_more = page.pagination.has_more;
                merge_append(&mut inner.records, page.users);
                inner.status = FeedStatus::Ready;
                inner.last_error = None;
            }
            Err(error) => {
                warn!(offset, %error, "load_more failed");
                inner.status = FeedStatus::Error;
                inner.last_error = Some(error.to_string());
            }
        }

        // A refresh that completed while this request was in flight is
        // applied now, in arrival order.
        if let Some(page) = inner.parked_refresh.take() {
            debug!("applying parked refresh");
            apply_replacement(&mut inner, page);
        }
        true
    }

    async fn refresh(&self) -> bool {
        let run_initial = {
            let mut inner = self.inner.lock();
            match inner.status {
                FeedStatus::Empty | FeedStatus::Error => true,
                FeedStatus::LoadingInitial | FeedStatus::Refreshing => return false,
                FeedStatus::LoadingMore | FeedStatus::Ready => {
                    if inner.refresh_inflight {
                        return false;
                    }
                    inner.refresh_inflight = true;
                    if inner.status == FeedStatus::Ready {
                        inner.status = FeedStatus::Refreshing;
                    }
                    false
                }
            }
        };
        if run_initial {
            return self.load_initial().await;
        }

        let result = self.client.fetch_page(self.config.page_size, 0).await;
        let mut inner = self.inner.lock();
        inner.refresh_inflight = false;
        match result {
            Ok(page) => {
                if inner.status == FeedStatus::LoadingMore {
                    inner.parked_refresh = Some(page);
                } else {
                    debug!(records = page.users.len(), "refresh applied");
                    apply_replacement(&mut inner, page);
                }
            }
            Err(error) => {
                warn!(%error, "refresh failed");
                inner.last_error = Some(error.to_string());
                // The load-more outcome decides the visible status if
                // one is in flight; otherwise wait for the next tick.
                if inner.status != FeedStatus::LoadingMore {
                    inner.status = FeedStatus::Error;
                }
            }
        }
        true
    }
}

/// The paginated feed controller.
///
/// All operations take `&self`; state is guarded internally and no
/// lock is held across a suspension point. Error propagation policy:
/// fetch failures are absorbed into [`FeedStatus::Error`], never
/// raised to the caller. Each operation returns whether it actually
/// issued a request, which doubles as the idempotence signal (a
/// `load_more` while one is outstanding is a no-op returning `false`).
pub struct FeedController<C: RankingClient> {
    shared: Arc<FeedShared<C>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: RankingClient> FeedController<C> {
    /// Creates a feed controller in the empty state.
    pub fn new(client: Arc<C>, gate: Arc<LifecycleGate>, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(FeedShared {
                client,
                gate,
                config,
                inner: Mutex::new(FeedInner {
                    records: Vec::new(),
                    status: FeedStatus::Empty,
                    next_offset: 0,
                    has_more: false,
                    last_error: None,
                    parked_refresh: None,
                    refresh_inflight: false,
                }),
            }),
            refresh_task: Mutex::new(None),
        }
    }

    /// Returns a read-only snapshot of the current feed state.
    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.shared.inner.lock();
        FeedSnapshot {
            records: inner.records.clone(),
            status: inner.status,
            has_more: inner.has_more,
            next_offset: inner.next_offset,
            last_error: inner.last_error.clone(),
        }
    }

    /// Fetches the first page, replacing any prior state.
    ///
    /// Only valid from `Empty` or `Error` (the explicit retry path);
    /// a no-op otherwise. Returns whether a request was issued.
    pub async fn load_initial(&self) -> bool {
        self.shared.load_initial().await
    }

    /// Fetches the next page and appends it to the accumulated
    /// sequence, deduplicating by username (newest fetch wins).
    ///
    /// No-op unless the feed is `Ready` with more data available,
    /// which enforces at most one outstanding page request at a time.
    /// On failure the already-loaded pages stay intact; only the
    /// trailing request is marked failed.
    pub async fn load_more(&self) -> bool {
        self.shared.load_more().await
    }

    /// Refetches the top page and replaces the accumulated sequence.
    ///
    /// Timer-driven; from `Empty` or `Error` it performs the
    /// initial-load path instead. If a load-more is in flight the
    /// replacement is parked and applied after it resolves, so an
    /// in-flight load-more is never interrupted. Returns whether a
    /// request was issued.
    pub async fn refresh(&self) -> bool {
        self.shared.refresh().await
    }

    /// Starts the periodic refresh task.
    ///
    /// Ticks fire every [`EngineConfig::refresh_interval`] and are
    /// skipped outright while the lifecycle gate is inactive — no
    /// backlog accumulates, and reactivating resumes the normal
    /// interval without a burst of queued requests.
    pub fn start_auto_refresh(&self) {
        let mut slot = self.refresh_task.lock();
        if slot.is_some() {
            return;
        }
        let weak = Arc::downgrade(&self.shared);
        let period = self.shared.config.refresh_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !shared.gate.is_active() {
                    continue;
                }
                shared.refresh().await;
            }
        }));
    }

    /// Stops the periodic refresh task.
    pub fn shutdown(&self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
    }
}

impl<C: RankingClient> Drop for FeedController<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Replaces the accumulated sequence with a freshly fetched top page.
fn apply_replacement(inner: &mut FeedInner, page: LeaderboardPage) {
    inner.records = dedup_ordered(page.users);
    inner.next_offset = inner.records.len() as u64;
    inner.has_more = page.pagination.has_more;
    inner.status = FeedStatus::Ready;
    inner.last_error = None;
    inner.parked_refresh = None;
}

/// Appends `incoming` to `existing`, deduplicating by username.
///
/// A username already present keeps its slot in fetch order but takes
/// the incoming attributes: the newest fetch always wins, fields are
/// never merged.
fn merge_append(existing: &mut Vec<RankedUser>, incoming: Vec<RankedUser>) {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, user)| (user.username.clone(), i))
        .collect();
    for user in incoming {
        match index.get(&user.username) {
            Some(&slot) => existing[slot] = user,
            None => {
                index.insert(user.username.clone(), existing.len());
                existing.push(user);
            }
        }
    }
}

/// Deduplicates a single page in place, last occurrence winning.
fn dedup_ordered(users: Vec<RankedUser>) -> Vec<RankedUser> {
    let mut out = Vec::with_capacity(users.len());
    merge_append(&mut out, users);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(name: &str, rating: i64, rank: u64) -> RankedUser {
        RankedUser::new(name, rating, rank)
    }

    #[test]
    fn merge_append_prefers_newest_on_conflict() {
        let mut records = vec![user("alice", 2400, 1), user("bob", 2100, 2)];
        merge_append(
            &mut records,
            vec![user("bob", 2150, 1), user("carol", 1900, 3)],
        );

        assert_eq!(records.len(), 3);
        // bob keeps his fetch-order slot but takes the new attributes.
        assert_eq!(records[1].username, "bob");
        assert_eq!(records[1].rating, 2150);
        assert_eq!(records[1].rank, 1);
        assert_eq!(records[2].username, "carol");
    }

    #[test]
    fn dedup_ordered_last_occurrence_wins() {
        let out = dedup_ordered(vec![
            user("alice", 2400, 1),
            user("bob", 2100, 2),
            user("alice", 2500, 1),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].username, "alice");
        assert_eq!(out[0].rating, 2500);
    }

    proptest! {
        /// Any sequence of overlapping page fetches leaves each
        /// username in the accumulated feed exactly once, carrying the
        /// attributes of its most recent fetch.
        #[test]
        fn accumulated_feed_is_unique_and_newest_wins(
            pages in prop::collection::vec(
                prop::collection::vec((0u8..20, 0i64..3000), 0..15),
                0..8,
            )
        ) {
            let mut records = Vec::new();
            for page in &pages {
                let incoming: Vec<RankedUser> = page
                    .iter()
                    .map(|&(id, rating)| user(&format!("user{id}"), rating, u64::from(id) + 1))
                    .collect();
                merge_append(&mut records, incoming);
            }

            let mut seen = std::collections::HashSet::new();
            for record in &records {
                prop_assert!(seen.insert(record.username.clone()));
            }

            // Last fetched attributes win for every username.
            let mut latest = HashMap::new();
            for page in &pages {
                for &(id, rating) in page {
                    latest.insert(format!("user{id}"), rating);
                }
            }
            for record in &records {
                prop_assert_eq!(record.rating, latest[&record.username]);
            }
        }
    }
}
