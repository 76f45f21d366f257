//! Error types for the storybook service.
//!
//! Every layer owns an error type following the same shape:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind with the source location it was raised at
//! - constructors use `#[track_caller]` so the location is captured automatically
//!
//! [`StorybookError`] is the boxed top-level error every crate returns, and
//! [`ErrorClass`] tells the HTTP boundary whether a failure is the caller's
//! fault (validation, not found, authorization) or ours (oracle, persistence).
//!
//! # Examples
//!
//! ```
//! use storybook_error::{ErrorClass, StorybookResult, ValidationError};
//!
//! fn check_spreads(count: usize) -> StorybookResult<()> {
//!     if count != 14 {
//!         Err(ValidationError::new("spreads", format!("expected 14 items, got {}", count)))?
//!     }
//!     Ok(())
//! }
//!
//! let err = check_spreads(13).unwrap_err();
//! assert_eq!(err.class(), ErrorClass::Client);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod class;
mod config;
mod database;
mod error;
mod oracle;
mod pipeline;
mod service;
mod stage;
mod storage;
mod validation;

pub use auth::{AuthError, AuthErrorKind};
pub use class::ErrorClass;
pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{StorybookError, StorybookErrorKind, StorybookResult};
pub use oracle::{OracleError, OracleErrorKind};
pub use pipeline::PipelineInputError;
pub use service::{ServiceError, ServiceErrorKind};
pub use stage::StageError;
pub use storage::{StorageError, StorageErrorKind};
pub use validation::ValidationError;
