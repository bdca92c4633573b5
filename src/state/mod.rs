use std::sync::Arc;

use crate::{
    auth::IdentityProvider,
    config::AppConfig,
    dao::{data_store::DataStore, profile::ProfileRepository},
};

pub type SharedState = Arc<AppState>;

/// Process-wide handles shared by every request.
///
/// The store client and identity provider are injected at construction so tests and binaries
/// pick their own backends.
pub struct AppState {
    profiles: ProfileRepository,
    identity: Arc<dyn IdentityProvider>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityProvider>,
        config: AppConfig,
    ) -> SharedState {
        Arc::new(Self {
            profiles: ProfileRepository::new(store),
            identity,
            config,
        })
    }

    pub fn profiles(&self) -> &ProfileRepository {
        &self.profiles
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
