//! In-memory cache storage.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and as the working set behind [`FileCacheStorage`](crate::FileCacheStorage).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use keel_core::error::Result;
use keel_core::traits::{Cache, CacheStorage};
use keel_core::types::{CacheEntry, MatchOptions, Request, Response};

/// A single named in-memory cache.
///
/// Entries are kept in insertion order; a `put` for a request that is
/// already stored replaces that entry in place.
#[derive(Debug)]
pub struct MemoryCache {
    name: String,
    /// Creation sequence within the owning storage
    seq: u64,
    entries: RwLock<Vec<CacheEntry>>,
}

impl MemoryCache {
    fn new(name: &str, seq: u64) -> Self {
        Self {
            name: name.to_string(),
            seq,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a copy of all entries.
    pub fn snapshot(&self) -> Vec<CacheEntry> {
        self.entries.read().clone()
    }

    /// Stores a prepared entry, replacing one for the same request.
    pub fn insert(&self, entry: CacheEntry) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.is_for(&entry.request)) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    fn find(&self, request: &Request, options: MatchOptions) -> Option<Response> {
        self.entries
            .read()
            .iter()
            .find(|e| options.matches(&e.request, request))
            .map(|e| e.response.clone())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    #[instrument(skip(self, request), fields(cache = %self.name, url = %request.url))]
    async fn match_request(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>> {
        let found = self.find(request, options);
        debug!(hit = found.is_some(), "Cache lookup");
        Ok(found)
    }

    #[instrument(skip(self, request, response), fields(cache = %self.name, url = %request.url))]
    async fn put(&self, request: &Request, response: Response) -> Result<()> {
        debug!(status = response.status, "Storing response");
        self.insert(CacheEntry::new(request.clone(), response));
        Ok(())
    }

    async fn delete(&self, request: &Request, options: MatchOptions) -> Result<bool> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| !options.matches(&e.request, request));
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> Result<Vec<Request>> {
        Ok(self.entries.read().iter().map(|e| e.request.clone()).collect())
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.snapshot())
    }
}

/// In-memory cache storage.
///
/// Uses concurrent data structures for thread-safe access without
/// requiring external synchronization.
#[derive(Debug)]
pub struct MemoryCacheStorage {
    /// Name → cache
    caches: DashMap<String, Arc<MemoryCache>>,
    /// Next creation sequence number
    next_seq: AtomicU64,
}

impl MemoryCacheStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self {
            caches: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Opens a cache and returns the concrete type.
    pub fn open_memory(&self, name: &str) -> Arc<MemoryCache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(name, "Creating cache");
                Arc::new(MemoryCache::new(name, self.next_seq.fetch_add(1, Ordering::SeqCst)))
            })
            .clone()
    }

    /// Returns the caches in creation order.
    pub fn caches(&self) -> Vec<Arc<MemoryCache>> {
        let mut caches: Vec<Arc<MemoryCache>> =
            self.caches.iter().map(|entry| entry.value().clone()).collect();
        caches.sort_by_key(|c| c.seq);
        caches
    }

    /// Returns the number of caches.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Returns true if no cache exists.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Removes every cache.
    pub fn clear(&self) {
        self.caches.clear();
    }

    /// Restores caches from `(name, entries)` pairs, in order.
    pub fn import(&self, caches: Vec<(String, Vec<CacheEntry>)>) -> usize {
        let mut imported = 0;
        for (name, entries) in caches {
            let cache = self.open_memory(&name);
            for entry in entries {
                cache.insert(entry);
                imported += 1;
            }
        }
        imported
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>> {
        let cache: Arc<dyn Cache> = self.open_memory(name);
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.caches.contains_key(name))
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.caches.remove(name).is_some();
        debug!(removed, "Delete cache");
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.caches().iter().map(|c| c.name.clone()).collect())
    }
}
