//! Fetch Error Types
//!
//! Transport failures are translated into a small set of kinds as soon as a
//! response (or its absence) is observed, so retry decisions and the source
//! boundary never have to inspect `reqwest` errors.

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upstream responded 404.
    #[display("content not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The upstream responded 503.
    #[display("service temporarily unavailable: {_0}")]
    ServiceUnavailable(#[error(not(source))] String),
    /// The request did not complete within the configured timeout.
    #[display("request timed out: {_0}")]
    Timeout(#[error(not(source))] String),
    /// Any other non-success status.
    #[display("failed to fetch {path}: {status}")]
    Status {
        path: String,
        status: u16,
    },
    /// Connection, TLS or protocol failure before a status was received.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The response body could not be read or decoded.
    #[display("failed to decode response from {_0}")]
    Decode(#[error(not(source))] String),
    /// The request queue was shut down before the task ran.
    #[display("request queue closed")]
    QueueClosed,
    /// The HTTP client could not be built or the request URL is invalid.
    #[display("client error: {_0}")]
    Client(#[error(not(source))] String),
}
impl ErrorKind {
    /// Translates a transport error observed while fetching `path`.
    pub(crate) fn from_transport(path: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(path.to_string())
        } else if err.is_decode() || err.is_body() {
            Self::Decode(path.to_string())
        } else if err.is_builder() {
            Self::Client(path.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(path, status.as_u16())
        } else {
            Self::Network(path.to_string())
        }
    }

    /// Translates a non-success status.
    pub(crate) fn from_status(path: &str, status: u16) -> Self {
        match status {
            404 => Self::NotFound(path.to_string()),
            503 => Self::ServiceUnavailable(path.to_string()),
            _ => Self::Status { path: path.to_string(), status },
        }
    }

    /// Returns `true` for failures a later attempt is likely to get past.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::Network(_))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            other => other.is_transient(),
        }
    }
}
