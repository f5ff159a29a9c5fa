//! Defaults shared across the KEEL crates.

/// Name of the cache a worker owns unless configured otherwise.
pub const DEFAULT_CACHE_NAME: &str = "keel-site-cache";

/// Paths pre-populated into the cache at install time, relative to the worker scope.
pub const CORE_ASSETS: &[&str] = &["./", "./index.html", "./manifest.webmanifest"];

/// How long a navigation waits for the network before falling back to the cache.
pub const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 2500;

/// Message type that asks a waiting worker to activate immediately.
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

/// Media type whose presence in `Accept` marks a document request.
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// Request timeout used by the HTTP fetcher when none is configured.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// User agent sent to the upstream origin.
pub const USER_AGENT: &str = concat!("keel/", env!("CARGO_PKG_VERSION"));
