//! Authentication error types.

/// Reasons a bearer token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AuthErrorKind {
    /// No `Authorization: Bearer` header
    #[display("Missing bearer token")]
    MissingToken,
    /// Token could not be decoded or verified
    #[display("Invalid token: {}", _0)]
    InvalidToken(String),
    /// Token has expired
    #[display("Token expired")]
    Expired,
    /// Signing key with the token's `kid` is not published
    #[display("Unknown signing key: {}", _0)]
    UnknownKey(String),
    /// Key set could not be fetched from the identity provider
    #[display("Failed to fetch signing keys: {}", _0)]
    KeyFetch(String),
}

/// Authentication error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Auth Error: {} at line {} in {}", kind, line, file)]
pub struct AuthError {
    /// The kind of error that occurred
    pub kind: AuthErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AuthError {
    /// Create a new AuthError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AuthErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
