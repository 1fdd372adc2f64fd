//! Upstream search sources.
//!
//! [`CoreClient`] fronts the CORE v3 works search endpoint. It compiles
//! [`FilterCriteria`](crate::models::FilterCriteria) into a canonical query,
//! serves repeated queries from the [`ResultCache`](crate::utils::ResultCache),
//! and collapses concurrent identical misses into a single upstream call.
//!
//! # Error policy
//!
//! Cache failures never fail a search: an unreachable store is bypassed and a
//! corrupt entry is refetched. Upstream failures are terminal for the call and
//! are never retried.

mod core;
pub mod mock;

pub use self::core::{CoreClient, CORE_SEARCH_URL, USER_AGENT};
pub use mock::MockTransport;

/// Errors that can occur while searching
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Network or transport failure before a response was received
    #[error("Upstream request failed: {0}")]
    UpstreamRequest(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Malformed JSON or an unparseable date in the response body
    #[error("Failed to decode upstream response: {0}")]
    ResponseDecode(String),

    /// The caller's deadline elapsed before the search finished
    #[error("Search deadline exceeded")]
    DeadlineExceeded,
}

impl SearchError {
    /// HTTP status for [`SearchError::UpstreamStatus`]
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::UpstreamRequest(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::ResponseDecode(err.to_string())
    }
}
