//! Request-level errors raised by the service layer.

/// Caller-facing failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ServiceErrorKind {
    /// Referenced entity does not exist
    #[display("{} {} not found", entity, id)]
    NotFound {
        /// Entity type, e.g. "storybook"
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },
    /// Caller may not access or mutate the resource
    #[display("Forbidden: {}", _0)]
    Forbidden(String),
    /// Request was well-formed but not acceptable
    #[display("Bad request: {}", _0)]
    BadRequest(String),
}

/// Service error with location tracking.
///
/// # Examples
///
/// ```
/// use storybook_error::{ServiceError, ServiceErrorKind};
///
/// let err = ServiceError::not_found("storybook", "sb-9");
/// assert!(matches!(err.kind, ServiceErrorKind::NotFound { .. }));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Service Error: {} at line {} in {}", kind, line, file)]
pub struct ServiceError {
    /// The kind of error that occurred
    pub kind: ServiceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ServiceError {
    /// Create a new ServiceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServiceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`ServiceErrorKind::NotFound`].
    #[track_caller]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound {
            entity,
            id: id.into(),
        })
    }

    /// Shorthand for [`ServiceErrorKind::Forbidden`].
    #[track_caller]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Forbidden(reason.into()))
    }

    /// Shorthand for [`ServiceErrorKind::BadRequest`].
    #[track_caller]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::BadRequest(reason.into()))
    }
}
