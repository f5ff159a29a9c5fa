//! File-based cache storage with persistence.
//!
//! Keeps every cache in a single file so cached assets survive restarts
//! until they are explicitly deleted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use keel_core::error::{KeelError, Result};
use keel_core::traits::{Cache, CacheStorage};
use keel_core::types::{CacheEntry, MatchOptions, Request, Response};

use crate::memory::{MemoryCache, MemoryCacheStorage};

/// File format magic bytes
const MAGIC: &[u8; 4] = b"KEEL";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + cache count
const HEADER_LEN: usize = 13;

#[derive(Serialize, Deserialize)]
struct PersistedCache {
    name: String,
    entries: Vec<CacheEntry>,
}

/// File-based cache storage.
///
/// Uses a memory storage internally and rewrites the file after mutations.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "KEEL"
/// version (1 byte): 1
/// count (8 bytes): number of caches
/// caches (variable): JSON array of { name, entries }, bodies hex-encoded
/// ```
#[derive(Clone)]
pub struct FileCacheStorage {
    state: Arc<FileState>,
}

struct FileState {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory working set
    memory: MemoryCacheStorage,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Save after this many writes (0 = every write)
    auto_save_threshold: u64,
    /// Writes since last save
    writes_since_save: AtomicU64,
    /// Serializes snapshot + write so an older snapshot never lands last
    save_lock: Mutex<()>,
}

impl FileCacheStorage {
    /// Opens storage at the given path.
    ///
    /// If the file exists, it will be loaded. Otherwise, an empty storage
    /// is created and the file will be written on the first mutation.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_auto_save(path, 0).await
    }

    /// Opens storage that saves only every `threshold` writes.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let state = FileState {
            path: path.as_ref().to_path_buf(),
            memory: MemoryCacheStorage::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: threshold,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if state.path.exists() {
            state.load().await?;
        }

        Ok(Self {
            state: Arc::new(state),
        })
    }

    /// Saves all caches to the file.
    pub async fn save(&self) -> Result<()> {
        self.state.save().await
    }

    /// Forces a save if dirty.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::SeqCst)
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Returns the underlying memory storage for direct access.
    pub fn memory(&self) -> &MemoryCacheStorage {
        &self.state.memory
    }
}

impl FileState {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await.map_err(|e| {
            KeelError::IoError(std::io::Error::new(e.kind(), format!("Failed to open cache file: {}", e)))
        })?;

        if contents.len() < HEADER_LEN {
            return Err(KeelError::StorageError("File too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(KeelError::StorageError("Invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != VERSION {
            return Err(KeelError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
        let count = u64::from_le_bytes(count_bytes);

        let caches: Vec<PersistedCache> = serde_json::from_slice(&contents[HEADER_LEN..])
            .map_err(|e| KeelError::StorageError(format!("Corrupt cache payload: {}", e)))?;

        if caches.len() as u64 != count {
            return Err(KeelError::StorageError(format!(
                "Cache count mismatch: header says {}, payload has {}",
                count,
                caches.len()
            )));
        }

        let entries = self
            .memory
            .import(caches.into_iter().map(|c| (c.name, c.entries)).collect());
        info!(caches = count, entries, "Loaded cache storage");

        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;

        // Writes landing after the snapshot mark the storage dirty again
        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        let caches: Vec<PersistedCache> = self
            .memory
            .caches()
            .iter()
            .map(|c| PersistedCache {
                name: c.name().to_string(),
                entries: c.snapshot(),
            })
            .collect();

        if let Err(err) = self.write_snapshot(&caches).await {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(err);
        }

        debug!(caches = caches.len(), "Cache storage saved");
        Ok(())
    }

    async fn write_snapshot(&self, caches: &[PersistedCache]) -> Result<()> {
        let count = caches.len() as u64;
        let serialized = serde_json::to_vec(caches)?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write to temp, then rename
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(bytes = contents.len(), "Wrote cache file");
        Ok(())
    }

    async fn record_write(&self) -> Result<()> {
        self.dirty.store(true, Ordering::SeqCst);
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            self.save().await?;
        }
        Ok(())
    }
}

impl Drop for FileState {
    fn drop(&mut self) {
        if self.dirty.load(Ordering::SeqCst) {
            warn!(path = ?self.path, "FileCacheStorage dropped with unsaved changes");
        }
    }
}

/// A cache handle that persists its owner after each mutation.
struct FileCache {
    inner: Arc<MemoryCache>,
    state: Arc<FileState>,
}

#[async_trait]
impl Cache for FileCache {
    async fn match_request(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>> {
        self.inner.match_request(request, options).await
    }

    async fn put(&self, request: &Request, response: Response) -> Result<()> {
        self.inner.put(request, response).await?;
        self.state.record_write().await
    }

    async fn delete(&self, request: &Request, options: MatchOptions) -> Result<bool> {
        let removed = self.inner.delete(request, options).await?;
        if removed {
            self.state.record_write().await?;
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<Request>> {
        self.inner.keys().await
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        self.inner.entries().await
    }
}

#[async_trait]
impl CacheStorage for FileCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>> {
        let existed = self.state.memory.has(name).await?;
        let inner = self.state.memory.open_memory(name);
        if !existed {
            self.state.record_write().await?;
        }
        Ok(Arc::new(FileCache {
            inner,
            state: self.state.clone(),
        }))
    }

    async fn has(&self, name: &str) -> Result<bool> {
        self.state.memory.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.state.memory.delete(name).await?;
        if removed {
            self.state.record_write().await?;
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.state.memory.keys().await
    }
}
