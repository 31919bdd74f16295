//! Aggregate statistics poller.
//!
//! Polls the service's stats endpoint on a slower interval than the
//! feed refresh, gated by the same lifecycle signal. Failures are
//! absorbed; the previously fetched stats stay visible.

use crate::config::EngineConfig;
use crate::lifecycle::LifecycleGate;
use parking_lot::Mutex;
use rankfeed_api::{LeaderboardStats, RankingClient};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::warn;

/// Read-only snapshot of the stats poller.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    /// Most recently fetched stats, if any fetch has succeeded.
    pub stats: Option<LeaderboardStats>,
    /// Whether a fetch is in flight.
    pub is_loading: bool,
    /// Whether the most recent fetch failed.
    pub is_error: bool,
    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,
}

struct StatsInner {
    stats: Option<LeaderboardStats>,
    loading: bool,
    last_error: Option<String>,
}

struct StatsShared<C: RankingClient> {
    client: Arc<C>,
    gate: Arc<LifecycleGate>,
    config: EngineConfig,
    inner: Mutex<StatsInner>,
}

impl<C: RankingClient> StatsShared<C> {
    async fn fetch_once(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.loading {
                return false;
            }
            inner.loading = true;
        }

        let result = self.client.fetch_stats().await;
        let mut inner = self.inner.lock();
        inner.loading = false;
        match result {
            Ok(stats) => {
                inner.stats = Some(stats);
                inner.last_error = None;
            }
            Err(error) => {
                warn!(%error, "stats fetch failed");
                // Previous stats stay visible.
                inner.last_error = Some(error.to_string());
            }
        }
        true
    }
}

/// Periodic aggregate-stats poller.
pub struct StatsPoller<C: RankingClient> {
    shared: Arc<StatsShared<C>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: RankingClient> StatsPoller<C> {
    /// Creates a stats poller with nothing fetched yet.
    pub fn new(client: Arc<C>, gate: Arc<LifecycleGate>, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(StatsShared {
                client,
                gate,
                config,
                inner: Mutex::new(StatsInner {
                    stats: None,
                    loading: false,
                    last_error: None,
                }),
            }),
            poll_task: Mutex::new(None),
        }
    }

    /// Returns a read-only snapshot of the poller state.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.shared.inner.lock();
        StatsSnapshot {
            stats: inner.stats,
            is_loading: inner.loading,
            is_error: inner.last_error.is_some(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Fetches stats once. Returns whether a request was issued
    /// (`false` while another fetch is in flight).
    pub async fn fetch_once(&self) -> bool {
        self.shared.fetch_once().await
    }

    /// Starts the periodic polling task, gated like the feed refresh:
    /// ticks are skipped while inactive, never queued.
    pub fn start(&self) {
        let mut slot = self.poll_task.lock();
        if slot.is_some() {
            return;
        }
        let weak = Arc::downgrade(&self.shared);
        let period = self.shared.config.stats_interval;
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
                shared.fetch_once().await;
            }
        }));
    }

    /// Stops the periodic polling task.
    pub fn shutdown(&self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
        }
    }
}

impl<C: RankingClient> Drop for StatsPoller<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
