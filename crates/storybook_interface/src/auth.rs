//! Bearer token verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storybook_error::StorybookResult;

/// The `aud` claim, which may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// One audience
    One(String),
    /// Several audiences
    Many(Vec<String>),
}

impl Audience {
    /// Whether `audience` is among the token's audiences.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(value) => value == audience,
            Audience::Many(values) => values.iter().any(|v| v == audience),
        }
    }
}

/// Verified token claims. `sub` is the current user id everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: Audience,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Any other claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verifies bearer tokens and returns their claims.
///
/// Every failure (expiry, audience or issuer mismatch, bad signature,
/// missing claims) is an unauthorized error.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return its claims.
    async fn verify(&self, token: &str) -> StorybookResult<Claims>;
}
