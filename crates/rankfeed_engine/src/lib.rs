//! # Rankfeed Engine
//!
//! Client-side synchronization engine for live leaderboards.
//!
//! This crate provides:
//! - Lifecycle gate (foreground/background signal gating periodic work)
//! - Paginated feed controller (load-initial / load-more / periodic
//!   refresh-from-top with an explicit status machine)
//! - Search overlay controller (debounced, stale-suppressed fuzzy search)
//! - Stats poller (slow-interval aggregate statistics)
//! - View reconciler (selects feed or search overlay at render time)
//!
//! ## Architecture
//!
//! The engine reconciles three independently-arriving data streams —
//! paginated bulk fetches, periodic full-state polling, and on-demand
//! fuzzy search — into one coherent view. The remote service is only
//! reached through [`rankfeed_api::RankingClient`]; rendering is the
//! host's problem and consumes read-only snapshots.
//!
//! ## Key Invariants
//!
//! - Usernames are unique within the accumulated feed; the newest
//!   fetch wins on conflict
//! - A refresh replaces the accumulated sequence, never appends, and
//!   never interrupts an in-flight load-more
//! - At most one outstanding load-more request at any time
//! - Superseded search responses are discarded by staleness token and
//!   never displayed
//! - Refresh ticks are skipped, not queued, while the lifecycle gate
//!   is inactive

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod feed;
mod lifecycle;
mod reconcile;
mod search;
mod stats;

pub use config::EngineConfig;
pub use feed::{FeedController, FeedSnapshot, FeedStatus};
pub use lifecycle::LifecycleGate;
pub use reconcile::{reconcile, RenderModel};
pub use search::{SearchController, SearchSnapshot, SearchStatus};
pub use stats::{StatsPoller, StatsSnapshot};
