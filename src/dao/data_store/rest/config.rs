use std::time::Duration;

use super::error::{RestDaoError, RestResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the hosted database REST endpoint.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project base URL, e.g. `https://project.example.co`.
    pub base_url: String,
    /// Service key sent both as `apikey` and bearer token.
    pub api_key: String,
    /// Overall per-request timeout of the HTTP client.
    pub timeout: Duration,
}

impl RestStoreConfig {
    /// Construct a configuration from an explicit base URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> RestResult<Self> {
        let base_url = std::env::var("KCLASH_STORE_URL").map_err(|_| RestDaoError::MissingEnvVar {
            var: "KCLASH_STORE_URL",
        })?;
        let api_key = std::env::var("KCLASH_STORE_KEY").map_err(|_| RestDaoError::MissingEnvVar {
            var: "KCLASH_STORE_KEY",
        })?;

        let mut config = Self::new(base_url, api_key);

        if let Some(secs) = std::env::var("KCLASH_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
