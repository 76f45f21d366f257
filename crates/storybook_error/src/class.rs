//! Coarse error classes used at the HTTP boundary.

/// Whose fault a failure is, and how it maps to an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorClass {
    /// Input failed validation or a precondition (400)
    #[display("client")]
    Client,
    /// Caller is not authenticated (401)
    #[display("unauthorized")]
    Unauthorized,
    /// Caller is authenticated but not allowed (403)
    #[display("forbidden")]
    Forbidden,
    /// Referenced resource does not exist (404)
    #[display("not_found")]
    NotFound,
    /// Concurrent modification detected (409)
    #[display("conflict")]
    Conflict,
    /// LLM or image provider failed (500)
    #[display("upstream")]
    Upstream,
    /// Persistence, storage or configuration failure (500)
    #[display("internal")]
    Internal,
}

impl ErrorClass {
    /// HTTP status code for this class.
    ///
    /// ```
    /// use storybook_error::ErrorClass;
    ///
    /// assert_eq!(ErrorClass::Forbidden.status_code(), 403);
    /// assert_eq!(ErrorClass::Upstream.status_code(), 500);
    /// ```
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::Client => 400,
            ErrorClass::Unauthorized => 401,
            ErrorClass::Forbidden => 403,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Upstream | ErrorClass::Internal => 500,
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_client_fault(self) -> bool {
        self.status_code() < 500
    }
}
