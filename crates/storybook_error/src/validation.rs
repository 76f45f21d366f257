//! Schema validation errors.

/// A structured value failed schema validation.
///
/// `path` names the offending field using dotted/indexed notation,
/// e.g. `spreads[3].script_2`, or `$` for the document root.
///
/// # Examples
///
/// ```
/// use storybook_error::ValidationError;
///
/// let err = ValidationError::new("characters", "expected at least 1 item, got 0");
/// assert_eq!(err.path, "characters");
/// assert!(format!("{}", err).contains("characters"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {}: {} at line {} in {}", path, message, line, file)]
pub struct ValidationError {
    /// Path of the offending field
    pub path: String,
    /// What was wrong with it
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError at the current location.
    #[track_caller]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            path: path.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Prefix the field path with a parent segment.
    ///
    /// ```
    /// use storybook_error::ValidationError;
    ///
    /// let err = ValidationError::new("script_1", "missing field").within("spreads[2]");
    /// assert_eq!(err.path, "spreads[2].script_1");
    /// ```
    pub fn within(mut self, parent: &str) -> Self {
        self.path = if self.path.is_empty() || self.path == "$" {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.path)
        };
        self
    }
}

impl From<derive_builder::UninitializedFieldError> for ValidationError {
    #[track_caller]
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        ValidationError::new(err.field_name(), "missing required field")
    }
}
