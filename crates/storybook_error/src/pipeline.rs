//! Pipeline precondition errors.

/// A generation stage was invoked without the input it needs.
///
/// Always client-correctable: the named field must be supplied before the
/// stage can run.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display(
    "Pipeline Input Error: storybook {} is missing {} at line {} in {}",
    storybook_id,
    field,
    line,
    file
)]
pub struct PipelineInputError {
    /// Storybook the stage was run against
    pub storybook_id: String,
    /// Name of the missing field
    pub field: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl PipelineInputError {
    /// Create a new PipelineInputError at the current location.
    ///
    /// ```
    /// use storybook_error::PipelineInputError;
    ///
    /// let err = PipelineInputError::new("sb-1", "creation_params.prompt");
    /// assert!(format!("{}", err).contains("creation_params.prompt"));
    /// ```
    #[track_caller]
    pub fn new(storybook_id: impl Into<String>, field: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            storybook_id: storybook_id.into(),
            field: field.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
