//! Host interfaces for KEEL.
//!
//! A worker never talks to disk or sockets directly. It runs against these
//! traits, so the same coordinator can be hosted in-process, behind the
//! proxy, or against test doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CacheEntry, MatchOptions, Request, Response};

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// A single named request → response store.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the first stored response matching `request`.
    async fn match_request(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>>;

    /// Stores `response` under `request`, replacing an entry for the same request.
    async fn put(&self, request: &Request, response: Response) -> Result<()>;

    /// Removes every entry matching `request`. Returns true if anything was removed.
    async fn delete(&self, request: &Request, options: MatchOptions) -> Result<bool>;

    /// Returns the stored requests in insertion order.
    async fn keys(&self) -> Result<Vec<Request>>;

    /// Returns all stored entries in insertion order.
    async fn entries(&self) -> Result<Vec<CacheEntry>>;
}

/// The set of named caches available to a worker.
///
/// Implementations might use:
/// - In-memory maps (for testing/development)
/// - A persisted file (survives restarts)
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the cache called `name`, creating it if needed.
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>>;

    /// Returns true if a cache called `name` exists.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Deletes the cache called `name`. Returns true if it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Returns every cache name in creation order.
    async fn keys(&self) -> Result<Vec<String>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for fetching a request from the network.
///
/// A non-2xx status is a successful fetch; only transport failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs the request.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        (**self).fetch(request).await
    }
}
