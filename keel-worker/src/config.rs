//! Worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use keel_core::constants::{CORE_ASSETS, DEFAULT_CACHE_NAME, DEFAULT_NETWORK_TIMEOUT_MS};
use keel_core::error::{KeelError, Result};

/// Configuration for a [`Worker`](crate::Worker).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// URL the core assets resolve against (the site root or worker script URL)
    pub scope: Url,
    /// Name of the cache the worker owns; every other cache is deleted on activate
    pub cache_name: String,
    /// Paths pre-populated at install time
    pub core_assets: Vec<String>,
    /// How long navigations wait for the network before using the cache
    pub network_timeout_ms: u64,
    /// Request skip-waiting as soon as install completes
    pub skip_waiting_on_install: bool,
}

impl WorkerConfig {
    /// Creates a configuration with the default cache name, assets and timeout.
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            core_assets: CORE_ASSETS.iter().map(|s| s.to_string()).collect(),
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
            skip_waiting_on_install: true,
        }
    }

    /// Parses `scope` and creates a default configuration.
    pub fn for_scope(scope: &str) -> Result<Self> {
        let url = Url::parse(scope).map_err(|e| KeelError::InvalidUrl {
            input: scope.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(url))
    }

    /// Sets the cache name.
    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Replaces the core asset list.
    pub fn core_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the navigation timeout.
    pub fn network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Leaves the worker waiting after install until it is told to skip waiting.
    pub fn wait_for_skip_message(mut self) -> Self {
        self.skip_waiting_on_install = false;
        self
    }

    /// Navigation timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.cache_name.trim().is_empty() {
            return Err(KeelError::ConfigError("cache name cannot be empty".into()));
        }
        if self.network_timeout_ms == 0 {
            return Err(KeelError::ConfigError("network timeout must be positive".into()));
        }
        if self.scope.cannot_be_a_base() {
            return Err(KeelError::ConfigError(format!(
                "scope '{}' cannot resolve relative paths",
                self.scope
            )));
        }
        Ok(())
    }
}
