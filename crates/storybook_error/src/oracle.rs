//! Errors raised by LLM and image-generation providers.

/// Oracle failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OracleErrorKind {
    /// Transport-level failure (connect, timeout, TLS)
    #[display("HTTP request failed: {}", _0)]
    Http(String),
    /// Provider answered with a non-success status
    #[display("Provider returned {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },
    /// Response body could not be parsed
    #[display("Failed to parse provider response: {}", _0)]
    Deserialization(String),
    /// Provider returned no usable content
    #[display("Empty response from {}", _0)]
    EmptyResponse(String),
    /// Provider does not support the requested operation
    #[display("Unsupported operation: {}", _0)]
    Unsupported(String),
}

/// Oracle error with source location tracking.
///
/// # Examples
///
/// ```
/// use storybook_error::{OracleError, OracleErrorKind};
///
/// let err = OracleError::new(OracleErrorKind::EmptyResponse("answer".to_string()));
/// assert!(format!("{}", err).contains("Empty response"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Oracle Error: {} at line {} in {}", kind, line, file)]
pub struct OracleError {
    /// The kind of error that occurred
    pub kind: OracleErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl OracleError {
    /// Create a new OracleError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OracleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
