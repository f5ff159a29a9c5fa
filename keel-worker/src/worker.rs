//! The cache coordinator.
//!
//! A [`Worker`] owns one named cache. Install pre-populates it with the core
//! assets, activate deletes every other cache, and fetch events are answered
//! with one of two strategies:
//!
//! - **network-first** for page navigations and HTML requests, racing the
//!   network against a timer and falling back to the cache;
//! - **stale-while-revalidate** for every other GET, answering from the
//!   cache and refreshing it in the background.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use keel_core::error::{KeelError, Result};
use keel_core::traits::{Cache, CacheStorage, Fetcher};
use keel_core::types::{CacheMode, MatchOptions, Method, Request, Response, WorkerMessage};

use crate::clients::Clients;
use crate::config::WorkerConfig;
use crate::lifecycle::WorkerState;

/// What a worker did with an intercepted request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough,
    /// Answered by the worker.
    Respond(Response),
}

impl FetchOutcome {
    /// Returns the response if the worker answered.
    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }
}

/// Cache coordinator for one named cache.
pub struct Worker {
    id: Uuid,
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<Clients>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    /// Background revalidations still in flight
    background: Mutex<JoinSet<()>>,
}

impl Worker {
    /// Creates a worker in the `Parsed` state.
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<Clients>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            storage,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            background: Mutex::new(JoinSet::new()),
        })
    }

    /// Unique worker id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Name of the cache this worker owns.
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    /// Storage the worker runs against.
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    fn transition(&self, next: WorkerState) -> Result<()> {
        let mut state = self.state.write();
        *state = state.transition(next)?;
        debug!(worker = %self.id, state = %next, "State change");
        Ok(())
    }

    /// Marks the worker as replaced or failed.
    pub fn mark_redundant(&self) {
        let mut state = self.state.write();
        if *state != WorkerState::Redundant {
            debug!(worker = %self.id, from = %*state, "Worker redundant");
            *state = WorkerState::Redundant;
        }
    }

    /// Asks to be activated without waiting for older workers' clients.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Returns true once skip-waiting has been requested.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn open_cache(&self) -> Result<Arc<dyn Cache>> {
        self.storage.open(&self.config.cache_name).await
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Opens the cache and stores every core asset, fetched past any HTTP cache.
    ///
    /// Returns the number of assets stored. Any failed or non-2xx fetch fails
    /// the install and leaves the worker redundant.
    #[instrument(skip(self), fields(worker = %self.id, cache = %self.config.cache_name))]
    pub async fn install(&self) -> Result<usize> {
        self.transition(WorkerState::Installing)?;

        match self.precache().await {
            Ok(stored) => {
                self.transition(WorkerState::Installed)?;
                if self.config.skip_waiting_on_install {
                    self.skip_waiting();
                }
                info!(stored, "Installed");
                Ok(stored)
            }
            Err(err) => {
                warn!(error = %err, "Install failed");
                self.mark_redundant();
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize> {
        let cache = self.open_cache().await?;

        let requests = self
            .config
            .core_assets
            .iter()
            .map(|path| {
                Request::resolve(&self.config.scope, path)
                    .map(|req| req.with_cache_mode(CacheMode::Reload))
            })
            .collect::<Result<Vec<_>>>()?;

        let results = join_all(requests.iter().map(|req| self.add(cache.as_ref(), req))).await;

        let mut stored = 0;
        for result in results {
            result.map_err(|e| KeelError::InstallFailed(e.to_string()))?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Fetches `request` and stores the response; non-2xx is an error.
    async fn add(&self, cache: &dyn Cache, request: &Request) -> Result<()> {
        let response = self.fetcher.fetch(request).await?;
        if !response.ok() {
            return Err(KeelError::BadResponse {
                url: request.url.to_string(),
                status: response.status,
            });
        }
        cache.put(request, response).await
    }

    /// Deletes every cache except this worker's, then claims all clients.
    ///
    /// Returns the names of the deleted caches.
    #[instrument(skip(self), fields(worker = %self.id, cache = %self.config.cache_name))]
    pub async fn activate(&self) -> Result<Vec<String>> {
        self.transition(WorkerState::Activating)?;

        match self.remove_stale_caches().await {
            Ok(deleted) => {
                let claimed = self.clients.claim(self.id);
                self.transition(WorkerState::Activated)?;
                info!(deleted = deleted.len(), claimed, "Activated");
                Ok(deleted)
            }
            Err(err) => {
                warn!(error = %err, "Activate failed");
                self.mark_redundant();
                Err(err)
            }
        }
    }

    async fn remove_stale_caches(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != self.config.cache_name)
            .collect();

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
        for result in results {
            result?;
        }

        Ok(stale)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handles an intercepted request.
    ///
    /// Only GET is intercepted. Navigations and HTML requests go network-first,
    /// everything else stale-while-revalidate.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome> {
        if request.method != Method::Get {
            return Ok(FetchOutcome::Passthrough);
        }

        let response = if request.is_document_request() {
            self.network_first(&request, self.config.timeout()).await?
        } else {
            self.stale_while_revalidate(&request)
                .await?
                .ok_or_else(|| KeelError::NoResponse(request.url.to_string()))?
        };

        Ok(FetchOutcome::Respond(response))
    }

    /// Handles a client message. Returns the recognised message, if any.
    pub fn handle_message(&self, payload: &serde_json::Value) -> Option<WorkerMessage> {
        let message = WorkerMessage::parse(payload);
        match &message {
            Some(WorkerMessage::SkipWaiting) => {
                debug!(worker = %self.id, "Skip waiting requested by client");
                self.skip_waiting();
            }
            None => debug!(worker = %self.id, "Ignoring unrecognised message"),
        }
        message
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STRATEGIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Races the network against `timeout`; falls back to the cache.
    ///
    /// A response that wins the race is returned as is and stored when 2xx.
    /// On error or timeout the cached match (query ignored) is returned;
    /// without one the error propagates. A fetch that loses the race keeps
    /// running detached and its result is dropped.
    pub async fn network_first(&self, request: &Request, timeout: Duration) -> Result<Response> {
        let cache = self.open_cache().await?;

        let fetcher = self.fetcher.clone();
        let live = request.clone();
        let network = tokio::spawn(async move { fetcher.fetch(&live).await });

        let outcome = match tokio::time::timeout(timeout, network).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(KeelError::InternalError(join_err.to_string())),
            Err(_) => Err(KeelError::Timeout {
                url: request.url.to_string(),
                millis: timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(response) => {
                if response.ok() {
                    if let Err(err) = cache.put(request, response.clone()).await {
                        warn!(error = %err, "Failed to store network response");
                    }
                }
                Ok(response)
            }
            Err(err) => {
                debug!(error = %err, "Network unavailable, trying cache");
                match cache.match_request(request, MatchOptions::ignore_search()).await? {
                    Some(cached) => Ok(cached),
                    None => Err(err),
                }
            }
        }
    }

    /// Answers from the cache and refreshes it in the background.
    ///
    /// With no cached match the network fetch is awaited instead. Network
    /// errors are swallowed, so `None` means neither side had a response.
    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Option<Response>> {
        let cache = self.open_cache().await?;
        let cached = cache.match_request(request, MatchOptions::ignore_search()).await?;

        let refresh = revalidate(self.fetcher.clone(), cache, request.clone());
        match cached {
            Some(cached) => {
                self.spawn_background(async move {
                    refresh.await;
                });
                Ok(Some(cached))
            }
            None => Ok(refresh.await),
        }
    }

    fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut background = self.background.lock();
        // Reap finished tasks so the set does not grow without bound
        while background.try_join_next().is_some() {}
        background.spawn(task);
    }

    /// Number of background tasks not yet reaped.
    pub fn pending_background(&self) -> usize {
        self.background.lock().len()
    }

    /// Waits for every background revalidation started so far.
    pub async fn settle(&self) {
        let mut tasks = std::mem::replace(&mut *self.background.lock(), JoinSet::new());
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "Background task failed");
            }
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("cache_name", &self.config.cache_name)
            .field("state", &self.state())
            .finish()
    }
}

/// Fetches `request` and stores the response when 2xx.
async fn revalidate(fetcher: Arc<dyn Fetcher>, cache: Arc<dyn Cache>, request: Request) -> Option<Response> {
    match fetcher.fetch(&request).await {
        Ok(response) => {
            if response.ok() {
                if let Err(err) = cache.put(&request, response.clone()).await {
                    warn!(url = %request.url, error = %err, "Failed to store revalidated response");
                }
            }
            Some(response)
        }
        Err(err) => {
            debug!(url = %request.url, error = %err, "Revalidation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFetcher, Route};
    use keel_core::types::RequestMode;
    use keel_storage::MemoryCacheStorage;
    use serde_json::json;

    const SCOPE: &str = "https://site.test/game/";

    struct Harness {
        storage: Arc<MemoryCacheStorage>,
        fetcher: Arc<MockFetcher>,
        clients: Arc<Clients>,
        worker: Worker,
    }

    fn harness() -> Harness {
        harness_with(WorkerConfig::for_scope(SCOPE).unwrap())
    }

    fn harness_with(config: WorkerConfig) -> Harness {
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = Arc::new(MockFetcher::new());
        let clients = Arc::new(Clients::new());
        let worker = Worker::new(config, storage.clone(), fetcher.clone(), clients.clone()).unwrap();
        Harness {
            storage,
            fetcher,
            clients,
            worker,
        }
    }

    fn serve_core_assets(fetcher: &MockFetcher) {
        fetcher.route("/game/", Route::ok("<html>root</html>"));
        fetcher.route("/game/index.html", Route::ok("<html>index</html>"));
        fetcher.route("/game/manifest.webmanifest", Route::ok("{}"));
    }

    async fn cached_text(h: &Harness, url: &str) -> Option<String> {
        let cache = h.storage.open_memory(DEFAULT_CACHE);
        cache
            .match_request(&Request::get(url).unwrap(), MatchOptions::exact())
            .await
            .unwrap()
            .map(|r| r.text())
    }

    const DEFAULT_CACHE: &str = keel_core::constants::DEFAULT_CACHE_NAME;

    // ─── install / activate ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_install_caches_every_core_asset() {
        let h = harness();
        serve_core_assets(&h.fetcher);

        let stored = h.worker.install().await.unwrap();
        assert_eq!(stored, 3);
        assert_eq!(h.worker.state(), WorkerState::Installed);
        assert!(h.worker.skip_waiting_requested());

        for url in [
            "https://site.test/game/",
            "https://site.test/game/index.html",
            "https://site.test/game/manifest.webmanifest",
        ] {
            assert!(cached_text(&h, url).await.is_some(), "{} missing", url);
        }
    }

    #[tokio::test]
    async fn test_install_bypasses_http_cache() {
        let h = harness();
        serve_core_assets(&h.fetcher);

        h.worker.install().await.unwrap();

        let calls = h.fetcher.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|r| r.cache == CacheMode::Reload));
    }

    #[tokio::test]
    async fn test_install_fails_on_missing_asset() {
        let h = harness();
        h.fetcher.route("/game/", Route::ok("root"));
        h.fetcher.route("/game/index.html", Route::ok("index"));
        h.fetcher.route("/game/manifest.webmanifest", Route::Status(404));

        let err = h.worker.install().await.unwrap_err();
        assert!(matches!(err, KeelError::InstallFailed(_)));
        assert_eq!(h.worker.state(), WorkerState::Redundant);
        assert!(!h.worker.skip_waiting_requested());
    }

    #[tokio::test]
    async fn test_install_without_auto_skip() {
        let h = harness_with(WorkerConfig::for_scope(SCOPE).unwrap().wait_for_skip_message());
        serve_core_assets(&h.fetcher);

        h.worker.install().await.unwrap();
        assert!(!h.worker.skip_waiting_requested());
    }

    #[tokio::test]
    async fn test_activate_deletes_other_caches_and_claims() {
        let h = harness();
        serve_core_assets(&h.fetcher);
        h.storage.open("keel-site-cache-v1").await.unwrap();
        h.storage.open("unrelated").await.unwrap();
        let client = h.clients.connect(None);

        h.worker.install().await.unwrap();
        let mut deleted = h.worker.activate().await.unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["keel-site-cache-v1", "unrelated"]);
        assert_eq!(h.storage.keys().await.unwrap(), vec![DEFAULT_CACHE]);
        assert_eq!(h.worker.state(), WorkerState::Activated);
        assert_eq!(h.clients.controller(client), Some(h.worker.id()));
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let h = harness();
        let err = h.worker.activate().await.unwrap_err();
        assert!(matches!(err, KeelError::InvalidTransition { .. }));
    }

    // ─── network-first ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_navigation_prefers_live_response() {
        let h = harness();
        h.fetcher.route("/game/index.html", Route::ok("live"));
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/index.html").unwrap(),
                Response::ok_with("stale"),
            ));

        let req = Request::navigate("https://site.test/game/index.html").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();

        assert_eq!(resp.text(), "live");
        assert_eq!(cached_text(&h, "https://site.test/game/index.html").await.as_deref(), Some("live"));
    }

    #[tokio::test]
    async fn test_navigation_error_status_not_cached() {
        let h = harness();
        h.fetcher.route("/game/index.html", Route::Status(500));

        let req = Request::navigate("https://site.test/game/index.html").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();

        assert_eq!(resp.status, 500);
        assert!(cached_text(&h, "https://site.test/game/index.html").await.is_none());
    }

    #[tokio::test]
    async fn test_navigation_offline_falls_back_ignoring_query() {
        let h = harness();
        h.fetcher.route("/game/index.html", Route::Fail);
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/index.html").unwrap(),
                Response::ok_with("cached"),
            ));

        let req = Request::navigate("https://site.test/game/index.html?level=3").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();
        assert_eq!(resp.text(), "cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_timeout_falls_back() {
        let h = harness();
        h.fetcher.route(
            "/game/",
            Route::Slow(Duration::from_secs(10), Response::ok_with("too late")),
        );
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/").unwrap(),
                Response::ok_with("cached"),
            ));

        let req = Request::navigate("https://site.test/game/").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();
        assert_eq!(resp.text(), "cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_network_response_not_cached() {
        let h = harness();
        h.fetcher.route(
            "/game/",
            Route::Slow(Duration::from_secs(10), Response::ok_with("too late")),
        );
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/").unwrap(),
                Response::ok_with("cached"),
            ));

        let req = Request::navigate("https://site.test/game/").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();
        assert_eq!(resp.text(), "cached");

        // Let the detached fetch finish well after the deadline
        tokio::time::sleep(Duration::from_secs(20)).await;
        h.worker.settle().await;

        assert_eq!(h.fetcher.call_count("/game/"), 1);
        assert_eq!(cached_text(&h, "https://site.test/game/").await.as_deref(), Some("cached"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_timeout_without_cache_errors() {
        let h = harness();
        h.fetcher.route(
            "/game/",
            Route::Slow(Duration::from_secs(10), Response::ok_with("too late")),
        );

        let req = Request::navigate("https://site.test/game/").unwrap();
        let err = h.worker.handle_fetch(req).await.unwrap_err();
        assert!(matches!(err, KeelError::Timeout { millis: 2500, .. }));
    }

    #[tokio::test]
    async fn test_navigation_offline_without_cache_propagates_error() {
        let h = harness();
        h.fetcher.route("/game/", Route::Fail);

        let req = Request::navigate("https://site.test/game/").unwrap();
        let err = h.worker.handle_fetch(req).await.unwrap_err();
        assert!(matches!(err, KeelError::Network { .. }));
    }

    #[tokio::test]
    async fn test_html_accept_uses_network_first() {
        let h = harness();
        h.fetcher.route("/game/about", Route::ok("live"));

        let req = Request::get("https://site.test/game/about")
            .unwrap()
            .with_mode(RequestMode::SameOrigin)
            .with_header("accept", "text/html");
        h.worker.handle_fetch(req).await.unwrap();

        // Network-first stores inline, nothing left in the background
        assert_eq!(h.worker.pending_background(), 0);
        assert_eq!(cached_text(&h, "https://site.test/game/about").await.as_deref(), Some("live"));
    }

    // ─── stale-while-revalidate ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_asset_served_stale_then_refreshed() {
        let h = harness();
        h.fetcher.route("/game/app.js", Route::ok("v2"));
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/app.js").unwrap(),
                Response::ok_with("v1"),
            ));

        let req = Request::get("https://site.test/game/app.js").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();
        assert_eq!(resp.text(), "v1");

        h.worker.settle().await;
        assert_eq!(cached_text(&h, "https://site.test/game/app.js").await.as_deref(), Some("v2"));
        assert_eq!(h.fetcher.call_count("/game/app.js"), 1);
    }

    #[tokio::test]
    async fn test_asset_miss_waits_for_network() {
        let h = harness();
        h.fetcher.route("/game/sprite.png", Route::ok("png"));

        let req = Request::get("https://site.test/game/sprite.png").unwrap();
        let resp = h.worker.handle_fetch(req).await.unwrap().into_response().unwrap();

        assert_eq!(resp.text(), "png");
        assert_eq!(cached_text(&h, "https://site.test/game/sprite.png").await.as_deref(), Some("png"));
    }

    #[tokio::test]
    async fn test_asset_offline_keeps_stale_copy() {
        let h = harness();
        h.fetcher.route("/game/app.css", Route::Fail);
        h.storage
            .open_memory(DEFAULT_CACHE)
            .insert(keel_core::types::CacheEntry::new(
                Request::get("https://site.test/game/app.css").unwrap(),
                Response::ok_with("stale"),
            ));

        let req = Request::get("https://site.test/game/app.css?v=9").unwrap();
        let resp = h.worker.stale_while_revalidate(&req).await.unwrap().unwrap();
        assert_eq!(resp.text(), "stale");

        h.worker.settle().await;
        assert_eq!(cached_text(&h, "https://site.test/game/app.css").await.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_asset_offline_and_uncached_has_no_response() {
        let h = harness();
        h.fetcher.route("/game/missing.js", Route::Fail);

        let req = Request::get("https://site.test/game/missing.js").unwrap();
        assert!(h.worker.stale_while_revalidate(&req).await.unwrap().is_none());

        let err = h.worker.handle_fetch(req).await.unwrap_err();
        assert!(matches!(err, KeelError::NoResponse(_)));
    }

    // ─── dispatch / messages ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let h = harness();
        h.fetcher.route("/game/api/score", Route::ok("stored"));

        for method in [Method::Post, Method::Put, Method::Delete, Method::Head] {
            let req = Request::new(method, "https://site.test/game/api/score").unwrap();
            let outcome = h.worker.handle_fetch(req).await.unwrap();
            assert_eq!(outcome, FetchOutcome::Passthrough);
        }
        assert!(h.fetcher.calls().is_empty());
    }

    #[test]
    fn test_skip_waiting_message() {
        let h = harness_with(WorkerConfig::for_scope(SCOPE).unwrap().wait_for_skip_message());

        assert_eq!(h.worker.handle_message(&json!({ "type": "PING" })), None);
        assert!(!h.worker.skip_waiting_requested());

        let msg = h.worker.handle_message(&json!({ "type": "SKIP_WAITING" }));
        assert_eq!(msg, Some(WorkerMessage::SkipWaiting));
        assert!(h.worker.skip_waiting_requested());
    }
}
