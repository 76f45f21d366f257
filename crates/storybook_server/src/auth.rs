//! Bearer token authentication.
//!
//! [`JwksVerifier`] checks RS256 tokens against the identity provider's
//! published key set. [`CurrentUser`] is the extractor every protected
//! handler takes; it reads `Authorization: Bearer <jwt>` and hands the token
//! to whichever [`TokenVerifier`] the [`AppState`] carries.

use crate::{AppError, AppState, AuthSettings};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use storybook_error::{AuthError, AuthErrorKind, StorybookError, StorybookResult};
use storybook_interface::{Claims, TokenVerifier};
use tokio::sync::RwLock;
use tracing::instrument;

/// Unknown key ids trigger at most one key set fetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL)
    }
}

/// Verifies RS256 tokens against a JWKS endpoint, caching keys by `kid`.
pub struct JwksVerifier {
    client: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    leeway_seconds: u64,
    cache: RwLock<KeyCache>,
}

impl std::fmt::Debug for JwksVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksVerifier")
            .field("jwks_url", &self.jwks_url)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl JwksVerifier {
    /// Create a verifier from the auth settings.
    pub fn new(settings: &AuthSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Create a verifier using `client` for key set fetches.
    pub fn with_client(settings: &AuthSettings, client: reqwest::Client) -> Self {
        Self {
            client,
            jwks_url: settings.jwks_url(),
            issuer: settings.issuer(),
            audience: settings.audience.clone(),
            leeway_seconds: settings.leeway_seconds,
            cache: RwLock::new(KeyCache::default()),
        }
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.keys.get(kid) {
                return Ok(key.clone());
            }
            if cache.is_fresh() {
                return Err(AuthError::new(AuthErrorKind::UnknownKey(kid.to_string())));
            }
        }

        self.refresh().await?;
        self.cache
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::new(AuthErrorKind::UnknownKey(kid.to_string())))
    }

    #[instrument(skip(self), fields(url = %self.jwks_url))]
    async fn refresh(&self) -> Result<(), AuthError> {
        let set: JwkSet = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::new(AuthErrorKind::KeyFetch(e.to_string())))?
            .json()
            .await
            .map_err(|e| AuthError::new(AuthErrorKind::KeyFetch(e.to_string())))?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => tracing::warn!(%kid, error = %e, "Skipping unusable signing key"),
            }
        }

        tracing::debug!(count = keys.len(), "Signing keys refreshed");
        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        Ok(())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = self.leeway_seconds;
        validation
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> StorybookResult<Claims> {
        let header = decode_header(token)
            .map_err(|e| AuthError::new(AuthErrorKind::InvalidToken(e.to_string())))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::new(AuthErrorKind::InvalidToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )))
            .into());
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::new(AuthErrorKind::InvalidToken("missing kid".to_string())))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<Claims>(token, &key, &self.validation()).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::new(AuthErrorKind::Expired),
            _ => AuthError::new(AuthErrorKind::InvalidToken(e.to_string())),
        })?;
        Ok(data.claims)
    }
}

/// The authenticated caller. `id` is the token's `sub`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User id
    pub id: String,
    /// Verified claims
    pub claims: Claims,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).map_err(|e| AppError(e.into()))?;
        let claims = state.verifier.verify(token).await?;
        if claims.sub.trim().is_empty() {
            let err: StorybookError =
                AuthError::new(AuthErrorKind::InvalidToken("empty subject".to_string())).into();
            return Err(err.into());
        }
        Ok(Self {
            id: claims.sub.clone(),
            claims,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::new(AuthErrorKind::MissingToken))?
        .to_str()
        .map_err(|_| {
            AuthError::new(AuthErrorKind::InvalidToken(
                "authorization header is not ASCII".to_string(),
            ))
        })?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::new(AuthErrorKind::MissingToken))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::new(AuthErrorKind::MissingToken));
    }
    Ok(token)
}
