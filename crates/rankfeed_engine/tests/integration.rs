//! Integration tests for the sync engine against a scripted client.
//!
//! All timer-sensitive tests run on the paused tokio clock, so
//! debounce windows, refresh ticks, and artificial request latencies
//! interleave deterministically.

use rankfeed_api::{ApiError, LeaderboardPage, LeaderboardStats, MockRankingClient, RankedUser};
use rankfeed_engine::{
    reconcile, EngineConfig, FeedController, FeedStatus, LifecycleGate, SearchController,
    SearchStatus, StatsPoller,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn users(first_rank: u64, count: u64) -> Vec<RankedUser> {
    (first_rank..first_rank + count)
        .map(|rank| RankedUser::new(format!("user{rank}"), 3000 - rank as i64, rank))
        .collect()
}

fn page(first_rank: u64, count: u64, total: u64, has_more: bool) -> LeaderboardPage {
    LeaderboardPage::new(users(first_rank, count), first_rank - 1, 50, total, has_more)
}

fn feed_fixture(
    mock: Arc<MockRankingClient>,
    gate: Arc<LifecycleGate>,
) -> FeedController<MockRankingClient> {
    FeedController::new(mock, gate, EngineConfig::new())
}

#[tokio::test(start_paused = true)]
async fn initial_load_then_load_more_scenario() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page(page(1, 50, 70, true));
    assert!(feed.load_initial().await);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.records.len(), 50);
    assert_eq!(snapshot.next_offset, 50);
    assert!(snapshot.has_more);
    assert_eq!(snapshot.status, FeedStatus::Ready);

    mock.push_page(page(51, 20, 70, false));
    assert!(feed.load_more().await);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.records.len(), 70);
    assert_eq!(snapshot.next_offset, 70);
    assert!(!snapshot.has_more);

    // End of data: further load_more calls are no-ops.
    assert!(!feed.load_more().await);
    assert_eq!(mock.page_calls(), vec![(50, 0), (50, 50)]);
}

#[tokio::test(start_paused = true)]
async fn load_more_is_idempotent_while_outstanding() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page(page(1, 50, 100, true));
    feed.load_initial().await;

    mock.push_page_delayed(page(51, 50, 100, false), Duration::from_millis(200));
    let (first, second) = tokio::join!(feed.load_more(), feed.load_more());
    assert!(first);
    assert!(!second, "second call must be a no-op while one is outstanding");

    // Exactly one trailing request went out.
    assert_eq!(mock.page_calls(), vec![(50, 0), (50, 50)]);
    assert_eq!(feed.snapshot().records.len(), 100);
}

#[tokio::test(start_paused = true)]
async fn refresh_replaces_accumulated_sequence() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page(page(1, 50, 70, true));
    feed.load_initial().await;
    mock.push_page(page(51, 20, 70, false));
    feed.load_more().await;
    assert_eq!(feed.snapshot().records.len(), 70);

    // Upstream ranks changed; the refresh returns a reshuffled top page.
    let mut reshuffled = users(1, 50);
    reshuffled[0] = RankedUser::new("user3", 2999, 1);
    mock.push_page(LeaderboardPage::new(reshuffled, 0, 50, 80, true));
    assert!(feed.refresh().await);

    let snapshot = feed.snapshot();
    // Replaced, not appended: the trailing pages are gone.
    assert_eq!(snapshot.records.len(), 50);
    assert_eq!(snapshot.next_offset, 50);
    assert!(snapshot.has_more);
    assert_eq!(snapshot.records[0].username, "user3");
    assert_eq!(snapshot.records[0].rank, 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_is_parked_behind_inflight_load_more() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page(page(1, 2, 10, true));
    feed.load_initial().await;

    // The load_more response arrives after the refresh response.
    mock.push_page_delayed(page(3, 2, 10, true), Duration::from_millis(300));
    mock.push_page_delayed(page(1, 2, 12, true), Duration::from_millis(50));

    let (more_issued, refresh_issued) = tokio::join!(feed.load_more(), feed.refresh());
    assert!(more_issued);
    assert!(refresh_issued);

    // The refresh replacement was applied after the load_more resolved:
    // the final state reflects the refresh's data, not a merge of both.
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.status, FeedStatus::Ready);
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(snapshot.records[0].username, "user1");
    assert_eq!(snapshot.next_offset, 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_ticks_skipped_while_inactive_without_burst() {
    let mock = Arc::new(MockRankingClient::new());
    let gate = Arc::new(LifecycleGate::new());
    gate.set_active(false);
    let feed = feed_fixture(Arc::clone(&mock), Arc::clone(&gate));

    feed.start_auto_refresh();

    // Five would-be ticks elapse while backgrounded: zero requests.
    sleep(Duration::from_secs(26)).await;
    assert!(mock.page_calls().is_empty());

    // Reactivating resumes the normal interval from this point with no
    // backlog of queued ticks.
    mock.push_page(page(1, 50, 50, false));
    gate.set_active(true);
    sleep(Duration::from_secs(6)).await;
    assert_eq!(mock.page_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_recovers_from_error_on_next_tick() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page_error(ApiError::transport("connection refused"));
    feed.start_auto_refresh();

    // First tick performs the initial load and fails.
    sleep(Duration::from_secs(6)).await;
    let snapshot = feed.snapshot();
    assert!(snapshot.is_error());
    assert!(snapshot.last_error.is_some());
    assert_eq!(mock.page_calls().len(), 1);

    // No immediate retry: recovery waits for the next natural tick.
    mock.push_page(page(1, 50, 50, false));
    sleep(Duration::from_secs(5)).await;
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.status, FeedStatus::Ready);
    assert_eq!(snapshot.records.len(), 50);
}

#[tokio::test(start_paused = true)]
async fn load_more_failure_keeps_loaded_pages() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));

    mock.push_page(page(1, 50, 100, true));
    feed.load_initial().await;

    mock.push_page_error(ApiError::Remote {
        status: 500,
        message: "internal".into(),
    });
    feed.load_more().await;

    let snapshot = feed.snapshot();
    assert!(snapshot.is_error());
    // The user never loses already-rendered data.
    assert_eq!(snapshot.records.len(), 50);
    assert_eq!(snapshot.next_offset, 50);
}

#[tokio::test(start_paused = true)]
async fn stale_search_response_is_suppressed() {
    let mock = Arc::new(MockRankingClient::new());
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    // "ab" answers slowly, "abc" quickly, so "ab" completes last.
    mock.set_search_response_delayed(
        "ab",
        vec![RankedUser::new("abigail", 2000, 5)],
        Duration::from_millis(400),
    );
    mock.set_search_response_delayed(
        "abc",
        vec![RankedUser::new("abcde", 1900, 9)],
        Duration::from_millis(50),
    );

    search.set_query("ab");
    sleep(Duration::from_millis(520)).await; // debounce fires, "ab" in flight
    search.set_query("abc");
    sleep(Duration::from_millis(520)).await; // "abc" in flight; "ab" completes stale
    sleep(Duration::from_millis(200)).await; // "abc" completes

    let snapshot = search.snapshot();
    assert_eq!(snapshot.status, SearchStatus::Ready);
    assert_eq!(snapshot.debounced_query, "abc");
    assert_eq!(snapshot.results.len(), 1);
    assert_eq!(snapshot.results[0].username, "abcde");
    assert_eq!(mock.search_calls(), vec!["ab".to_string(), "abc".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn keystroke_restarts_debounce_window() {
    let mock = Arc::new(MockRankingClient::new());
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    search.set_query("ab");
    sleep(Duration::from_millis(300)).await;
    search.set_query("abc");
    sleep(Duration::from_millis(300)).await;

    // 600ms elapsed but no window completed: nothing issued yet.
    assert!(mock.search_calls().is_empty());
    assert_eq!(search.snapshot().status, SearchStatus::Debouncing);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(mock.search_calls(), vec!["abc".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn short_query_never_issues_a_request() {
    let mock = Arc::new(MockRankingClient::new());
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    search.set_query("a");
    sleep(Duration::from_secs(2)).await;
    assert!(mock.search_calls().is_empty());
    assert_eq!(search.snapshot().status, SearchStatus::Idle);
    assert!(!search.snapshot().is_active);
}

#[tokio::test(start_paused = true)]
async fn query_cleared_before_debounce_issues_nothing() {
    let mock = Arc::new(MockRankingClient::new());
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    search.set_query("ab");
    sleep(Duration::from_millis(200)).await;
    search.set_query("");
    sleep(Duration::from_secs(2)).await;

    assert!(mock.search_calls().is_empty());
    let snapshot = search.snapshot();
    assert_eq!(snapshot.status, SearchStatus::Idle);
    assert!(snapshot.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn search_failure_never_touches_feed_state() {
    let mock = Arc::new(MockRankingClient::new());
    let gate = Arc::new(LifecycleGate::new());
    let feed = feed_fixture(Arc::clone(&mock), gate);
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    mock.push_page(page(1, 50, 50, false));
    feed.load_initial().await;

    mock.set_search_error(
        "zz",
        ApiError::Remote {
            status: 500,
            message: "search backend down".into(),
        },
    );
    search.set_query("zz");
    sleep(Duration::from_millis(600)).await;

    let search_snapshot = search.snapshot();
    assert_eq!(search_snapshot.status, SearchStatus::Error);

    // Feed state is untouched by the search failure.
    let feed_snapshot = feed.snapshot();
    assert_eq!(feed_snapshot.status, FeedStatus::Ready);
    assert_eq!(feed_snapshot.records.len(), 50);

    // While the overlay is active the rendered view carries the search
    // error; clearing the query falls back to the healthy feed.
    let model = reconcile(&feed_snapshot, &search_snapshot);
    assert!(model.is_error);
    search.set_query("");
    let model = reconcile(&feed.snapshot(), &search.snapshot());
    assert!(!model.is_error);
    assert_eq!(model.items.len(), 50);
}

#[tokio::test(start_paused = true)]
async fn empty_search_result_is_valid_and_reported() {
    let mock = Arc::new(MockRankingClient::new());
    let search = SearchController::new(Arc::clone(&mock), EngineConfig::new());

    mock.set_search_response("nobody", Vec::new());
    search.set_query("nobody");
    sleep(Duration::from_millis(600)).await;

    let snapshot = search.snapshot();
    assert_eq!(snapshot.status, SearchStatus::Empty);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn stats_poller_is_gated_and_keeps_previous_stats_on_failure() {
    let mock = Arc::new(MockRankingClient::new());
    let gate = Arc::new(LifecycleGate::new());
    let poller = StatsPoller::new(Arc::clone(&mock), Arc::clone(&gate), EngineConfig::new());

    let stats = LeaderboardStats {
        total_users: 10_000,
        unique_ratings: 1_800,
        highest_rating: 3_012,
        lowest_rating: 104,
    };
    mock.push_stats(stats);
    assert!(poller.fetch_once().await);
    assert_eq!(poller.snapshot().stats, Some(stats));

    // A failure is absorbed; the previous stats stay visible.
    mock.push_stats_error(ApiError::Timeout);
    poller.fetch_once().await;
    let snapshot = poller.snapshot();
    assert!(snapshot.is_error);
    assert_eq!(snapshot.stats, Some(stats));

    // Backgrounded: the poll loop issues nothing.
    gate.set_active(false);
    poller.start();
    sleep(Duration::from_secs(35)).await;
    assert_eq!(mock.stats_call_count(), 2);

    gate.set_active(true);
    mock.push_stats(stats);
    sleep(Duration::from_secs(11)).await;
    assert_eq!(mock.stats_call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_periodic_work() {
    let mock = Arc::new(MockRankingClient::new());
    let feed = feed_fixture(Arc::clone(&mock), Arc::new(LifecycleGate::new()));
    feed.start_auto_refresh();

    feed.shutdown();
    sleep(Duration::from_secs(30)).await;
    assert!(mock.page_calls().is_empty());
}
