//! Error types for the public command interface.
//!
//! Internally the crate uses `anyhow` through the `Res` alias. Command functions convert their
//! results with `pub_result` so that callers can tell which part of the program failed.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type returned by command functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// A request to the backend failed.
    Request,
    /// A report could not be built or rendered.
    Report,
    /// A local file operation failed.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error returned from a command, tagged with its `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            source: source.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.source)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate format prints the whole context chain.
        write!(f, "{} error: {:#}", self.error_type, self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context() {
        let res: Res<()> = Err(anyhow::anyhow!("disk full")).context("Unable to write report");
        let err = res.pub_result(ErrorType::Io).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
        let s = err.to_string();
        assert!(s.starts_with("io error: "));
        assert!(s.contains("Unable to write report"));
        assert!(s.contains("disk full"));
    }

    #[test]
    fn test_error_type_from_str() {
        let t: ErrorType = "request".parse().unwrap();
        assert_eq!(t, ErrorType::Request);
        assert_eq!(ErrorType::Config.to_string(), "config");
    }
}
