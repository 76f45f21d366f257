//! Errors raised while running a generation stage.

use crate::StorybookError;

/// A generation stage failed.
///
/// Wraps the underlying failure with the stage name. The error class of
/// the wrapped failure is preserved, so a schema mismatch inside the draft
/// stage is still a client-class error.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Stage Error: {} stage failed at line {} in {}: {}", stage, line, file, source)]
pub struct StageError {
    /// Stage name, e.g. "bible"
    pub stage: &'static str,
    /// Underlying failure
    pub source: StorybookError,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl StageError {
    /// Wrap a failure raised inside `stage`.
    #[track_caller]
    pub fn new(stage: &'static str, source: impl Into<StorybookError>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            stage,
            source: source.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
