//! HTTP transport implementation.
//!
//! The actual HTTP library is abstracted via a trait so different
//! implementations (reqwest, hyper, a loopback test double) can back
//! the same typed client.

use crate::client::RankingClient;
use crate::error::{ApiError, ApiResult};
use crate::types::{LeaderboardPage, LeaderboardStats, RankedUser, UserRankDetail};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default per-request deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. The ranking
/// service is consumed with GET requests only.
pub trait HttpClient: Send + Sync + 'static {
    /// Sends a GET request and returns status plus body.
    ///
    /// The error string covers transport-level failures only; a
    /// non-success status is a successful `get` with that status.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, String>> + Send;
}

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP-backed implementation of [`RankingClient`].
///
/// Every request carries the configured timeout; exceeding it is
/// reported as [`ApiError::Timeout`].
pub struct HttpRankingClient<C: HttpClient> {
    base_url: String,
    client: C,
    timeout: Duration,
}

impl<C: HttpClient> HttpRankingClient<C> {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_raw(&self, path_and_query: &str) -> ApiResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, path_and_query);
        match tokio::time::timeout(self.timeout, self.client.get(&url)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(message)) => {
                warn!(%url, %message, "transport failure");
                Err(ApiError::Transport { message })
            }
            Err(_) => {
                warn!(%url, timeout_ms = self.timeout.as_millis() as u64, "request deadline exceeded");
                Err(ApiError::Timeout)
            }
        }
    }

    fn decode<T: DeserializeOwned>(response: HttpResponse) -> ApiResult<T> {
        if !response.is_success() {
            return Err(ApiError::Remote {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> ApiResult<T> {
        let response = self.get_raw(path_and_query).await?;
        Self::decode(response)
    }
}

impl<C: HttpClient> RankingClient for HttpRankingClient<C> {
    async fn fetch_page(&self, limit: u32, offset: u64) -> ApiResult<LeaderboardPage> {
        self.get_json(&format!("/leaderboard?limit={limit}&offset={offset}"))
            .await
    }

    async fn fetch_user(&self, username: &str) -> ApiResult<UserRankDetail> {
        let path = format!("/user/{}", escape_component(username));
        let response = self.get_raw(&path).await?;
        if response.status == 404 {
            return Err(ApiError::NotFound {
                username: username.to_string(),
            });
        }
        Self::decode(response)
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<RankedUser>> {
        self.get_json(&format!("/search?q={}", escape_component(query)))
            .await
    }

    async fn fetch_stats(&self) -> ApiResult<LeaderboardStats> {
        self.get_json("/stats").await
    }
}

/// Percent-escapes a path or query component.
///
/// RFC 3986 unreserved characters pass through; everything else is
/// escaped byte-wise as uppercase `%XX`.
pub fn escape_component(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for byte in component.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char);
            }
            _ => {
                escaped.push('%');
                escaped.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0').to_ascii_uppercase());
                escaped.push(char::from_digit(u32::from(byte & 0xf), 16).unwrap_or('0').to_ascii_uppercase());
            }
        }
    }
    escaped
}
