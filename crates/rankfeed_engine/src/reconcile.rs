//! View reconciler.
//!
//! Pure selection of what the host should render: either the
//! paginated feed or the search overlay, never a blend of both.

use crate::feed::{FeedSnapshot, FeedStatus};
use crate::search::{SearchSnapshot, SearchStatus};
use rankfeed_api::RankedUser;

/// What the presentation layer renders.
#[derive(Debug, Clone)]
pub struct RenderModel {
    /// Ordered records to display.
    pub items: Vec<RankedUser>,
    /// Whether a loading indicator should replace or accompany the list.
    pub is_loading: bool,
    /// Whether an error indicator should be shown.
    pub is_error: bool,
    /// Message to show instead of an empty list, if any.
    pub empty_message: Option<String>,
}

/// Selects the visible list at render time.
///
/// If the search overlay is active (query at or above the minimum
/// length), the model is sourced exclusively from search state — the
/// feed's own loading and error flags are suppressed. Otherwise it is
/// sourced exclusively from feed state.
pub fn reconcile(feed: &FeedSnapshot, search: &SearchSnapshot) -> RenderModel {
    if search.is_active {
        let empty_message = (search.status == SearchStatus::Empty).then(|| {
            format!(
                "No users found matching \"{}\"",
                search.debounced_query
            )
        });
        return RenderModel {
            items: search.results.clone(),
            is_loading: search.is_loading(),
            is_error: search.is_error(),
            empty_message,
        };
    }

    let empty_message = (feed.status == FeedStatus::Ready && feed.records.is_empty())
        .then(|| "No users on the board yet".to_string());
    RenderModel {
        items: feed.records.clone(),
        is_loading: feed.is_loading(),
        is_error: feed.is_error(),
        empty_message,
    }
}
