//! Wire types for the ranking service.
//!
//! Field names match the service's JSON wire format exactly, so the
//! structs derive `Serialize`/`Deserialize` without rename attributes.

use serde::{Deserialize, Serialize};

/// One ranked entity as reported by the service.
///
/// A `RankedUser` is an immutable value object from the client's
/// perspective; a later fetch of the same `username` replaces it,
/// never mutates it in place. `rank` is only meaningful relative to
/// the full ranking, not to any single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUser {
    /// Unique, stable identity.
    pub username: String,
    /// Current score.
    pub rating: i64,
    /// Position in the full ranking (1-based).
    pub rank: u64,
}

impl RankedUser {
    /// Creates a ranked user.
    pub fn new(username: impl Into<String>, rating: i64, rank: u64) -> Self {
        Self {
            username: username.into(),
            rating,
            rank,
        }
    }
}

/// Pagination cursor attached to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Offset of the first record in this page.
    pub offset: u64,
    /// Requested page size.
    pub limit: u32,
    /// Total number of records in the ranking at fetch time.
    pub total: u64,
    /// Whether more records exist past this page.
    pub has_more: bool,
}

/// One bounded fetch result plus its pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardPage {
    /// Records in rank order within the page.
    pub users: Vec<RankedUser>,
    /// Cursor describing this page's position in the full ranking.
    pub pagination: PageCursor,
}

impl LeaderboardPage {
    /// Creates a page from records and cursor fields.
    pub fn new(users: Vec<RankedUser>, offset: u64, limit: u32, total: u64, has_more: bool) -> Self {
        Self {
            users,
            pagination: PageCursor {
                offset,
                limit,
                total,
                has_more,
            },
        }
    }
}

/// Single-user lookup result, including percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRankDetail {
    /// Unique, stable identity.
    pub username: String,
    /// Current score.
    pub rating: i64,
    /// Position in the full ranking (1-based).
    pub rank: u64,
    /// Percentile of this user's rating (0.0..=100.0).
    pub percentile: f64,
}

/// Aggregate statistics over the full ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStats {
    /// Total number of ranked users.
    pub total_users: u64,
    /// Number of distinct rating values.
    pub unique_ratings: u64,
    /// Highest rating in the ranking.
    pub highest_rating: i64,
    /// Lowest rating in the ranking.
    pub lowest_rating: i64,
}
