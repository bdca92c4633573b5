//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KCLASH_BACK_CONFIG_PATH";

const DEFAULT_USERNAME_PREFIX: &str = "gamer";
const DEFAULT_RECENT_MATCHES_LIMIT: usize = 5;
const DEFAULT_USERNAME_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Prefix of usernames generated for auto-created profiles.
    pub username_prefix: String,
    /// Number of matches exposed in the aggregate.
    pub recent_matches_limit: usize,
    /// How many generated usernames are tried before giving up on a conflict.
    pub username_attempts: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        username_prefix = %app_config.username_prefix,
                        recent_matches_limit = app_config.recent_matches_limit,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username_prefix: DEFAULT_USERNAME_PREFIX.into(),
            recent_matches_limit: DEFAULT_RECENT_MATCHES_LIMIT,
            username_attempts: DEFAULT_USERNAME_ATTEMPTS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file; every key is optional.
struct RawConfig {
    username_prefix: Option<String>,
    recent_matches_limit: Option<usize>,
    username_attempts: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            username_prefix: value
                .username_prefix
                .filter(|prefix| !prefix.trim().is_empty())
                .unwrap_or(defaults.username_prefix),
            recent_matches_limit: value
                .recent_matches_limit
                .unwrap_or(defaults.recent_matches_limit),
            username_attempts: value
                .username_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(defaults.username_attempts),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"recent_matches_limit": 10}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.recent_matches_limit, 10);
        assert_eq!(config.username_prefix, "gamer");
        assert_eq!(config.username_attempts, 3);
    }

    #[test]
    fn blank_prefix_and_zero_attempts_are_ignored() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"username_prefix": "  ", "username_attempts": 0}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.username_prefix, "gamer");
        assert_eq!(config.username_attempts, 3);
    }
}
