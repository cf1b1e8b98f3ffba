//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::state::{
    executor::{DEFAULT_FALLBACK_ERROR, DEFAULT_REMOTE_TIMEOUT, ExecutorSettings},
    guard::DEFAULT_DEBOUNCE_DELAY,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FANBASE_SYNC_CONFIG_PATH";
const BACKEND_URL_ENV: &str = "FANBASE_BACKEND_URL";
const PORT_ENV: &str = "PORT";

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FEEDBACK_CAPACITY: usize = 64;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Minimum spacing between two accepted requests for the same action and entity.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "debounce_delay_ms")]
    pub debounce_delay: Duration,
    /// Bound on a remote mutation; `null` disables it.
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>", no_default)]
    #[serde(rename = "remote_timeout_ms")]
    pub remote_timeout: Option<Duration>,
    /// Base URL of the remote server actions.
    pub backend_url: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Capacity of the feedback broadcast channel.
    pub feedback_capacity: usize,
    /// Error toast shown when the server gives no reason.
    pub fallback_error_message: String,
}

impl AppConfig {
    /// Load the configuration from disk and apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
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
        };

        config.with_env_overrides(|name| env::var(name).ok())
    }

    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|url| !url.is_empty()) {
            self.backend_url = url;
        }
        match lookup(PORT_ENV).map(|value| value.parse::<u16>()) {
            Some(Ok(port)) => self.port = port,
            Some(Err(err)) => warn!(error = %err, "ignoring invalid {PORT_ENV}"),
            None => {}
        }
        self
    }

    /// Settings handed to every optimistic executor.
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            remote_timeout: self.remote_timeout,
            fallback_error: Arc::from(self.fallback_error_message.as_str()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            remote_timeout: Some(DEFAULT_REMOTE_TIMEOUT),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            port: DEFAULT_PORT,
            feedback_capacity: DEFAULT_FEEDBACK_CAPACITY,
            fallback_error_message: DEFAULT_FALLBACK_ERROR.to_string(),
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
