//! Source Error Types
//!
//! This is the taxonomy callers of the scraping service see. Fetch failures
//! map onto it kind for kind, while every extraction failure becomes a
//! [`ErrorKind::ScrapeFailure`] naming the operation that produced it.

use derive_more::{Display, Error};
use exn::ResultExt;
use scanline_extract::error::Result as ExtractResult;
use scanline_fetch::error::{ErrorKind as FetchErrorKind, Result as FetchResult};

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested record does not exist upstream.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The upstream site is down or misbehaving.
    #[display("source unavailable: {_0}")]
    ServiceUnavailable(#[error(not(source))] String),
    #[display("source timed out: {_0}")]
    Timeout(#[error(not(source))] String),
    /// A document was fetched but no usable record could be extracted.
    #[display("failed to scrape {operation}")]
    ScrapeFailure { operation: &'static str },
    /// The request itself is malformed: an empty query, page zero, an empty id.
    #[display("invalid request: {_0}")]
    ValidationFailure(#[error(not(source))] String),
    /// The upstream site asked us to slow down.
    #[display("rate limited by source")]
    RateLimited,
    #[display("{site} does not support {operation}")]
    Unsupported { site: &'static str, operation: &'static str },
}

impl ErrorKind {
    /// Translates a fetch failure.
    pub fn from_fetch(kind: &FetchErrorKind) -> Self {
        match kind {
            FetchErrorKind::NotFound(path) => Self::NotFound(path.clone()),
            FetchErrorKind::ServiceUnavailable(path) => Self::ServiceUnavailable(path.clone()),
            FetchErrorKind::Timeout(path) => Self::Timeout(path.clone()),
            FetchErrorKind::Status { status: 429, .. } => Self::RateLimited,
            other => Self::ServiceUnavailable(other.to_string()),
        }
    }

    /// Status code a transport layer would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::ServiceUnavailable(_) => 503,
            Self::Timeout(_) => 504,
            Self::ScrapeFailure { .. } => 502,
            Self::ValidationFailure(_) => 400,
            Self::RateLimited => 429,
            Self::Unsupported { .. } => 501,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::RateLimited)
    }
}

/// Lifts a fetch result into the source taxonomy, keeping the fetch error as
/// the cause.
pub(crate) fn fetched<T>(result: FetchResult<T>) -> Result<T> {
    result.or_else(|err| {
        let kind = ErrorKind::from_fetch(&err);
        Err(err).or_raise(|| kind)
    })
}

/// Lifts an extraction result, attributing failures to `operation`.
pub(crate) fn extracted<T>(result: ExtractResult<T>, operation: &'static str) -> Result<T> {
    result.or_raise(|| ErrorKind::ScrapeFailure { operation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::Exn;
    use rstest::rstest;
    use scanline_extract::error::ErrorKind as ExtractErrorKind;

    #[rstest]
    #[case(FetchErrorKind::NotFound("/x".into()), ErrorKind::NotFound("/x".into()))]
    #[case(FetchErrorKind::ServiceUnavailable("/x".into()), ErrorKind::ServiceUnavailable("/x".into()))]
    #[case(FetchErrorKind::Timeout("/x".into()), ErrorKind::Timeout("/x".into()))]
    #[case(FetchErrorKind::Status { path: "/x".into(), status: 429 }, ErrorKind::RateLimited)]
    #[case(FetchErrorKind::Network("/x".into()), ErrorKind::ServiceUnavailable("network error: /x".into()))]
    fn fetch_kinds_map(#[case] fetch: FetchErrorKind, #[case] expected: ErrorKind) {
        assert_eq!(ErrorKind::from_fetch(&fetch), expected);
        let err = fetched::<()>(Err(Exn::from(fetch))).unwrap_err();
        assert_eq!(&*err, &expected);
    }

    #[test]
    fn extraction_failures_name_the_operation() {
        let err = extracted::<()>(Err(Exn::from(ExtractErrorKind::NoPages)), "chapter").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ScrapeFailure { operation: "chapter" }));
        assert_eq!(err.status_code(), 502);
        assert!(!err.is_retryable());
    }

    #[rstest]
    #[case(ErrorKind::NotFound("x".into()), 404)]
    #[case(ErrorKind::ServiceUnavailable("x".into()), 503)]
    #[case(ErrorKind::Timeout("x".into()), 504)]
    #[case(ErrorKind::ValidationFailure("x".into()), 400)]
    #[case(ErrorKind::RateLimited, 429)]
    #[case(ErrorKind::Unsupported { site: "omegascans", operation: "genres" }, 501)]
    fn status_codes(#[case] kind: ErrorKind, #[case] status: u16) {
        assert_eq!(kind.status_code(), status);
    }
}
