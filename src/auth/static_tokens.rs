use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use super::{AuthUserId, IdentityError, IdentityProvider};

/// Identity provider backed by a fixed token table, for local development and tests.
#[derive(Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: Arc<DashMap<String, AuthUserId>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to `user`.
    pub fn with_token(self, token: impl Into<String>, user: AuthUserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(
        &self,
        token: &str,
    ) -> BoxFuture<'static, Result<Option<AuthUserId>, IdentityError>> {
        let user = self.tokens.get(token).map(|entry| *entry);
        Box::pin(async move { Ok(user) })
    }
}
