//! Resolution of bearer tokens into authenticated identities issued by the hosted auth service.

#[cfg(feature = "rest-store")]
mod rest;
mod static_tokens;

use std::{error::Error, fmt};

use axum::http::{HeaderMap, header::AUTHORIZATION};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "rest-store")]
pub use rest::RestIdentityProvider;
pub use static_tokens::StaticIdentityProvider;

/// Identity of an authenticated caller as issued by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUserId(pub Uuid);

impl fmt::Display for AuthUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The identity provider could not answer.
#[derive(Debug, Error)]
#[error("identity provider unavailable: {message}")]
pub struct IdentityError {
    message: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl IdentityError {
    pub fn new(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message,
            source: Box::new(source),
        }
    }
}

/// Maps an access token to the caller's identity.
pub trait IdentityProvider: Send + Sync {
    /// Resolve `token`; `Ok(None)` when the token is unknown, expired or revoked.
    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<Option<AuthUserId>, IdentityError>>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(bearer_token(&headers), Some("tok-1"));
    }
}
