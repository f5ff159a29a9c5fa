//! App state: worker registration, storage, upstream fetcher, config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use url::Url;

use keel_core::constants::{DEFAULT_CACHE_NAME, DEFAULT_NETWORK_TIMEOUT_MS};
use keel_core::error::{KeelError, Result};
use keel_core::traits::{CacheStorage, Fetcher};
use keel_fetch::HttpFetcher;
use keel_storage::{FileCacheStorage, MemoryCacheStorage};
use keel_worker::{Clients, Registration, Worker, WorkerConfig};

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080/";

/// Proxy configuration.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Upstream site; always ends with `/`
    pub origin: Url,
    /// Cache owned by the worker
    pub cache_name: String,
    /// Navigation network timeout
    pub network_timeout_ms: u64,
    /// Persist caches here; memory only when unset
    pub cache_file: Option<PathBuf>,
}

impl ProxyConfig {
    /// Creates a configuration for `origin` with default cache settings.
    pub fn new(origin: &str) -> Result<Self> {
        Ok(Self {
            origin: parse_origin(origin)?,
            cache_name: DEFAULT_CACHE_NAME.into(),
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
            cache_file: None,
        })
    }

    /// Reads `KEEL_*` variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let origin = std::env::var("KEEL_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.into());
        let network_timeout_ms = match std::env::var("KEEL_NETWORK_TIMEOUT_MS") {
            Ok(v) => v.parse().map_err(|_| {
                KeelError::ConfigError(format!("KEEL_NETWORK_TIMEOUT_MS is not a number: {}", v))
            })?,
            Err(_) => DEFAULT_NETWORK_TIMEOUT_MS,
        };

        let mut config = Self::new(&origin)?;
        config.network_timeout_ms = network_timeout_ms;
        if let Ok(name) = std::env::var("KEEL_CACHE_NAME") {
            config.cache_name = name;
        }
        config.cache_file = std::env::var("KEEL_CACHE_FILE").ok().map(PathBuf::from);
        Ok(config)
    }

    /// Sets the cache name.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Persists caches to `path`.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Sets the navigation timeout.
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Worker configuration scoped to the origin.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new(self.origin.clone())
            .cache_name(self.cache_name.clone())
            .network_timeout(Duration::from_millis(self.network_timeout_ms))
    }
}

/// Parses an origin URL and makes sure relative paths resolve beneath it.
fn parse_origin(input: &str) -> Result<Url> {
    let mut url = Url::parse(input).map_err(|e| KeelError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(KeelError::InvalidUrl {
            input: input.to_string(),
            reason: "origin must be a hierarchical URL".into(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Shared state for the proxy handlers.
pub struct AppState {
    /// Proxy configuration
    pub config: ProxyConfig,
    /// Workers registered for the origin
    pub registration: Registration,
    /// Cache storage shared with the workers
    pub storage: Arc<dyn CacheStorage>,
    /// Upstream fetcher
    pub fetcher: Arc<dyn Fetcher>,
    /// Set when caches are persisted, so shutdown can flush them
    pub file: Option<FileCacheStorage>,
}

impl AppState {
    /// Opens the configured storage and creates an HTTP fetcher.
    pub async fn new(config: ProxyConfig) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);

        let file = match &config.cache_file {
            Some(path) => Some(FileCacheStorage::new(path).await?),
            None => None,
        };
        let storage: Arc<dyn CacheStorage> = match &file {
            Some(file) => Arc::new(file.clone()),
            None => Arc::new(MemoryCacheStorage::new()),
        };

        Ok(Self::with_parts(config, storage, fetcher, file))
    }

    /// Builds state from explicit parts.
    pub fn with_parts(
        config: ProxyConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        file: Option<FileCacheStorage>,
    ) -> Self {
        Self {
            config,
            registration: Registration::new(Arc::new(Clients::new())),
            storage,
            fetcher,
            file,
        }
    }

    /// Installs and activates a worker for the configured origin.
    pub async fn start_worker(&self) -> Result<Arc<Worker>> {
        let worker = Arc::new(Worker::new(
            self.config.worker_config(),
            self.storage.clone(),
            self.fetcher.clone(),
            self.registration.clients().clone(),
        )?);
        self.registration.register(worker.clone()).await?;
        info!(origin = %self.config.origin, worker = %worker.id(), state = %worker.state(), "Worker registered");
        Ok(worker)
    }

    /// Waits for background refreshes, then writes pending cache changes to disk.
    pub async fn flush(&self) -> Result<()> {
        if let Some(worker) = self.registration.active() {
            worker.settle().await;
        }
        if let Some(file) = &self.file {
            file.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_gets_trailing_slash() {
        let config = ProxyConfig::new("https://site.test/game").unwrap();
        assert_eq!(config.origin.as_str(), "https://site.test/game/");
        assert_eq!(
            config.origin.join("index.html").unwrap().as_str(),
            "https://site.test/game/index.html"
        );
    }

    #[test]
    fn test_invalid_origin_rejected() {
        assert!(ProxyConfig::new("not a url").is_err());
        assert!(ProxyConfig::new("mailto:someone@site.test").is_err());
    }

    #[test]
    fn test_worker_config_follows_proxy_config() {
        let config = ProxyConfig::new("https://site.test/")
            .unwrap()
            .with_cache_name("site-v2")
            .with_network_timeout(Duration::from_millis(800));
        let worker = config.worker_config();
        assert_eq!(worker.cache_name, "site-v2");
        assert_eq!(worker.network_timeout_ms, 800);
        assert_eq!(worker.scope.as_str(), "https://site.test/");
    }
}
