//! Top-level error wrapper types.

use crate::{
    AuthError, ConfigError, DatabaseError, DatabaseErrorKind, ErrorClass, OracleError,
    PipelineInputError, ServiceError, ServiceErrorKind, StageError, StorageError,
    StorageErrorKind, ValidationError,
};

/// Every failure the storybook service can raise.
///
/// # Examples
///
/// ```
/// use storybook_error::{StorybookError, ValidationError};
///
/// let err: StorybookError = ValidationError::new("spreads", "expected 14 items").into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StorybookErrorKind {
    /// Schema validation failure
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Missing pipeline precondition
    #[from(PipelineInputError)]
    PipelineInput(PipelineInputError),
    /// Not found / forbidden / bad request
    #[from(ServiceError)]
    Service(ServiceError),
    /// Bearer token rejected
    #[from(AuthError)]
    Auth(AuthError),
    /// LLM or image provider failure
    #[from(OracleError)]
    Oracle(OracleError),
    /// Record store failure
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Media storage failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration failure
    #[from(ConfigError)]
    Config(ConfigError),
    /// Generation stage failure
    #[from(StageError)]
    Stage(StageError),
}

/// Storybook error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storybook_error::{ErrorClass, ServiceError, StorybookResult};
///
/// fn load() -> StorybookResult<()> {
///     Err(ServiceError::forbidden("not the owner"))?
/// }
///
/// assert_eq!(load().unwrap_err().class(), ErrorClass::Forbidden);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storybook Error: {}", _0)]
pub struct StorybookError(Box<StorybookErrorKind>);

impl StorybookError {
    /// Create a new error from a kind.
    pub fn new(kind: StorybookErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorybookErrorKind {
        &self.0
    }

    /// Classify the failure for the HTTP boundary.
    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            StorybookErrorKind::Validation(_) | StorybookErrorKind::PipelineInput(_) => {
                ErrorClass::Client
            }
            StorybookErrorKind::Service(e) => match e.kind {
                ServiceErrorKind::NotFound { .. } => ErrorClass::NotFound,
                ServiceErrorKind::Forbidden(_) => ErrorClass::Forbidden,
                ServiceErrorKind::BadRequest(_) => ErrorClass::Client,
            },
            StorybookErrorKind::Auth(_) => ErrorClass::Unauthorized,
            StorybookErrorKind::Oracle(_) => ErrorClass::Upstream,
            StorybookErrorKind::Database(e) => match e.kind {
                DatabaseErrorKind::NotFound(_) => ErrorClass::NotFound,
                DatabaseErrorKind::Conflict(_) => ErrorClass::Conflict,
                _ => ErrorClass::Internal,
            },
            StorybookErrorKind::Storage(e) => match e.kind {
                StorageErrorKind::NotFound(_) => ErrorClass::NotFound,
                _ => ErrorClass::Internal,
            },
            StorybookErrorKind::Config(_) => ErrorClass::Internal,
            StorybookErrorKind::Stage(e) => e.source.class(),
        }
    }

    /// Innermost error, unwrapping stage wrappers.
    pub fn root(&self) -> &StorybookErrorKind {
        match self.kind() {
            StorybookErrorKind::Stage(e) => e.source.root(),
            kind => kind,
        }
    }
}

// Generic From implementation for any type that converts to StorybookErrorKind
impl<T> From<T> for StorybookError
where
    T: Into<StorybookErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for storybook operations.
pub type StorybookResult<T> = std::result::Result<T, StorybookError>;
