//! The ranking client trait and a scriptable mock.

use crate::error::{ApiError, ApiResult};
use crate::types::{LeaderboardPage, LeaderboardStats, RankedUser, UserRankDetail};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A ranking client handles all communication with the ranking service.
///
/// This trait abstracts the network layer, allowing different
/// implementations (HTTP via [`crate::HttpRankingClient`], a mock for
/// testing, etc.). All operations are suspension points; none block.
pub trait RankingClient: Send + Sync + 'static {
    /// Fetches one page of the ranking at the given offset.
    fn fetch_page(
        &self,
        limit: u32,
        offset: u64,
    ) -> impl Future<Output = ApiResult<LeaderboardPage>> + Send;

    /// Looks up a single user by identity.
    ///
    /// A miss is reported as [`ApiError::NotFound`].
    fn fetch_user(&self, username: &str) -> impl Future<Output = ApiResult<UserRankDetail>> + Send;

    /// Fuzzy-searches users. An empty result is valid, not an error.
    fn search_users(&self, query: &str)
        -> impl Future<Output = ApiResult<Vec<RankedUser>>> + Send;

    /// Fetches aggregate statistics over the full ranking.
    fn fetch_stats(&self) -> impl Future<Output = ApiResult<LeaderboardStats>> + Send;
}

/// A scriptable ranking client for tests.
///
/// Responses are queued per endpoint and may carry an artificial
/// latency, which lets paused-clock tests control the interleaving of
/// concurrent requests. Call logs support exactly-one-request
/// assertions.
#[derive(Default)]
pub struct MockRankingClient {
    page_responses: Mutex<VecDeque<(ApiResult<LeaderboardPage>, Duration)>>,
    search_responses: Mutex<HashMap<String, (ApiResult<Vec<RankedUser>>, Duration)>>,
    user_responses: Mutex<HashMap<String, ApiResult<UserRankDetail>>>,
    stats_responses: Mutex<VecDeque<(ApiResult<LeaderboardStats>, Duration)>>,
    page_calls: Mutex<Vec<(u32, u64)>>,
    search_calls: Mutex<Vec<String>>,
    stats_calls: AtomicU64,
}

impl MockRankingClient {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page response, served on the next `fetch_page` call.
    pub fn push_page(&self, page: LeaderboardPage) {
        self.push_page_delayed(page, Duration::ZERO);
    }

    /// Queues a page response that completes after `delay`.
    pub fn push_page_delayed(&self, page: LeaderboardPage, delay: Duration) {
        self.page_responses.lock().push_back((Ok(page), delay));
    }

    /// Queues a page failure.
    pub fn push_page_error(&self, error: ApiError) {
        self.page_responses
            .lock()
            .push_back((Err(error), Duration::ZERO));
    }

    /// Scripts the response for a specific search query.
    pub fn set_search_response(&self, query: impl Into<String>, users: Vec<RankedUser>) {
        self.set_search_response_delayed(query, users, Duration::ZERO);
    }

    /// Scripts a search response that completes after `delay`.
    pub fn set_search_response_delayed(
        &self,
        query: impl Into<String>,
        users: Vec<RankedUser>,
        delay: Duration,
    ) {
        self.search_responses
            .lock()
            .insert(query.into(), (Ok(users), delay));
    }

    /// Scripts a search failure for a specific query.
    pub fn set_search_error(&self, query: impl Into<String>, error: ApiError) {
        self.search_responses
            .lock()
            .insert(query.into(), (Err(error), Duration::ZERO));
    }

    /// Scripts the response for a single-user lookup.
    pub fn set_user_response(&self, username: impl Into<String>, detail: UserRankDetail) {
        self.user_responses.lock().insert(username.into(), Ok(detail));
    }

    /// Queues a stats response.
    pub fn push_stats(&self, stats: LeaderboardStats) {
        self.stats_responses
            .lock()
            .push_back((Ok(stats), Duration::ZERO));
    }

    /// Queues a stats failure.
    pub fn push_stats_error(&self, error: ApiError) {
        self.stats_responses
            .lock()
            .push_back((Err(error), Duration::ZERO));
    }

    /// Returns the `(limit, offset)` of every `fetch_page` call so far.
    pub fn page_calls(&self) -> Vec<(u32, u64)> {
        self.page_calls.lock().clone()
    }

    /// Returns every query passed to `search_users` so far.
    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }

    /// Returns the number of `fetch_stats` calls so far.
    pub fn stats_call_count(&self) -> u64 {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

impl RankingClient for MockRankingClient {
    async fn fetch_page(&self, limit: u32, offset: u64) -> ApiResult<LeaderboardPage> {
        self.page_calls.lock().push((limit, offset));
        let (result, delay) = self
            .page_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| (Err(ApiError::transport("no scripted page response")), Duration::ZERO));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_user(&self, username: &str) -> ApiResult<UserRankDetail> {
        self.user_responses
            .lock()
            .get(username)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::NotFound {
                    username: username.to_string(),
                })
            })
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<RankedUser>> {
        self.search_calls.lock().push(query.to_string());
        let (result, delay) = self
            .search_responses
            .lock()
            .get(query)
            .cloned()
            .unwrap_or((Ok(Vec::new()), Duration::ZERO));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_stats(&self) -> ApiResult<LeaderboardStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let (result, delay) = self
            .stats_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                (
                    Err(ApiError::transport("no scripted stats response")),
                    Duration::ZERO,
                )
            });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
