//! CLI Error Types

use derive_more::{Display, Error};
use exn::ResultExt;
use miette::Diagnostic;
use scanline_sources::error::Result as SourceResult;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("failed to load configuration")]
    #[diagnostic(code(scanline::config), help("check the config file and the SCANLINE_ environment variables"))]
    Config,
    #[display("failed to set up sources")]
    #[diagnostic(code(scanline::setup))]
    Setup,
    /// A source operation failed; `status` is the code a transport layer would use.
    #[display("{message}")]
    #[diagnostic(code(scanline::source))]
    Source { status: u16, message: String },
    #[display("failed to render output")]
    #[diagnostic(code(scanline::output))]
    Output,
}

/// Lifts a source failure, keeping its message and status.
pub fn sourced<T>(result: SourceResult<T>) -> Result<T> {
    result.or_else(|err| {
        let kind = ErrorKind::Source { status: err.status_code(), message: err.to_string() };
        Err(err).or_raise(|| kind)
    })
}

/// Converts into a report for the terminal, logging the full cause chain at
/// debug level first.
pub fn report(err: Error) -> miette::Report {
    tracing::debug!(error = ?err, "Command failed");
    let kind: &ErrorKind = &err;
    miette::Report::new(kind.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::Exn;
    use scanline_sources::error::ErrorKind as SourceErrorKind;

    #[test]
    fn source_failures_keep_status_and_message() {
        let err = sourced::<()>(Err(Exn::from(SourceErrorKind::NotFound("/manga/x".into())))).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Source { status: 404, message: "not found: /manga/x".to_string() });
    }

    #[test]
    fn reports_carry_a_diagnostic_code() {
        let report = report(Exn::from(ErrorKind::Config));
        assert_eq!(report.code().map(|code| code.to_string()).as_deref(), Some("scanline::config"));
        assert_eq!(report.to_string(), "failed to load configuration");
    }
}
