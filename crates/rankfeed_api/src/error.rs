//! Error types for remote ranking calls.

use thiserror::Error;

/// Result type for ranking client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the ranking service.
///
/// Every error is terminal for the specific request that raised it.
/// Controllers absorb these into their own status machines instead of
/// propagating them across component boundaries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network failure before a response was received.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying transport failure description.
        message: String,
    },

    /// The caller-supplied deadline elapsed.
    ///
    /// Treated identically to [`ApiError::Transport`] by callers.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("remote error (status {status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// A single-record lookup missed.
    #[error("user not found: {username}")]
    NotFound {
        /// The identity that was looked up.
        username: String,
    },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true for connectivity-shaped failures (transport or
    /// timeout), which periodic callers may retry on their next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Timeout)
    }

    /// Returns true if this is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
