//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration shared by the engine's controllers.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page size for both the initial load and load-more fetches.
    ///
    /// The periodic refresh refetches offset 0 with this same size.
    pub page_size: u32,
    /// Interval between refresh-from-top ticks while active.
    pub refresh_interval: Duration,
    /// Interval between aggregate-stats polls while active.
    pub stats_interval: Duration,
    /// Trailing-edge debounce delay for search keystrokes.
    pub search_debounce: Duration,
    /// Minimum query length before a search request is issued.
    pub min_query_len: usize,
}

impl EngineConfig {
    /// Creates a configuration with production defaults.
    pub fn new() -> Self {
        Self {
            page_size: 50,
            refresh_interval: Duration::from_secs(5),
            stats_interval: Duration::from_secs(10),
            search_debounce: Duration::from_millis(500),
            min_query_len: 2,
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the refresh-from-top interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Sets the stats polling interval.
    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Sets the search debounce delay.
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    /// Sets the minimum query length.
    pub fn with_min_query_len(mut self, len: usize) -> Self {
        self.min_query_len = len;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
