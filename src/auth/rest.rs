use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{AuthUserId, IdentityError, IdentityProvider};
use crate::dao::data_store::rest::RestStoreConfig;

#[derive(Debug, Error)]
#[error("unexpected auth status {0}")]
struct UnexpectedStatus(StatusCode);

#[derive(Deserialize)]
struct AuthUser {
    id: uuid::Uuid,
}

/// Resolves tokens against the hosted auth service (`GET /auth/v1/user`).
#[derive(Clone)]
pub struct RestIdentityProvider {
    client: Client,
    user_url: Arc<str>,
    api_key: Arc<str>,
}

impl RestIdentityProvider {
    pub fn new(config: &RestStoreConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| IdentityError::new("failed to build auth client".into(), source))?;

        Ok(Self {
            client,
            user_url: Arc::from(format!(
                "{}/auth/v1/user",
                config.base_url.trim_end_matches('/')
            )),
            api_key: Arc::from(config.api_key.as_str()),
        })
    }
}

impl IdentityProvider for RestIdentityProvider {
    fn resolve(
        &self,
        token: &str,
    ) -> BoxFuture<'static, Result<Option<AuthUserId>, IdentityError>> {
        let provider = self.clone();
        let token = token.to_owned();
        Box::pin(async move {
            let response = provider
                .client
                .get(provider.user_url.as_ref())
                .header("apikey", provider.api_key.as_ref())
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|source| IdentityError::new("auth request failed".into(), source))?;

            match response.status() {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
                status if status.is_success() => {
                    let user = response.json::<AuthUser>().await.map_err(|source| {
                        IdentityError::new("failed to decode auth user".into(), source)
                    })?;
                    Ok(Some(AuthUserId(user.id)))
                }
                other => Err(IdentityError::new(
                    "auth service rejected the request".into(),
                    UnexpectedStatus(other),
                )),
            }
        })
    }
}
