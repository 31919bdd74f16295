//! # Rankfeed API
//!
//! Typed client boundary to the remote ranking service.
//!
//! This crate provides:
//! - Wire types for the ranking service (pages, cursors, stats)
//! - Error taxonomy for remote calls
//! - The [`RankingClient`] trait consumed by the sync engine
//! - An HTTP transport implementation over an abstract [`HttpClient`]
//! - A scriptable [`MockRankingClient`] for tests
//!
//! ## Architecture
//!
//! The ranking service is consumed exclusively through [`RankingClient`].
//! The engine never sees HTTP; it sees typed pages, records, and errors.
//! [`HttpRankingClient`] adapts any [`HttpClient`] implementation
//! (reqwest, hyper, a loopback test double) to that trait.
//!
//! ## Key Invariants
//!
//! - An empty search result is a valid, non-error response
//! - Every call carries a caller-supplied timeout; exceeding it is
//!   reported as [`ApiError::Timeout`] and treated like a transport
//!   failure by callers
//! - Errors are terminal for the request that raised them

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod http;
mod types;

pub use client::{MockRankingClient, RankingClient};
pub use error::{ApiError, ApiResult};
pub use http::{escape_component, HttpClient, HttpRankingClient, HttpResponse};
pub use types::{LeaderboardPage, LeaderboardStats, PageCursor, RankedUser, UserRankDetail};
