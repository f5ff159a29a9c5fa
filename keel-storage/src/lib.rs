//! # KEEL Storage
//!
//! Cache storage backends for the KEEL offline asset cache.
//!
//! This crate provides two implementations of [`CacheStorage`]:
//!
//! - **Memory**: Fast in-memory storage for development and testing
//! - **File**: Persistent storage that survives restarts
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_storage::{CacheStorage, MemoryCacheStorage};
//!
//! let storage = MemoryCacheStorage::new();
//! let cache = storage.open("keel-site-cache").await?;
//! cache.put(&request, response).await?;
//!
//! // Drop everything that is not the current cache
//! for name in storage.keys().await? {
//!     if name != "keel-site-cache" {
//!         storage.delete(&name).await?;
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod file;

pub use memory::{MemoryCache, MemoryCacheStorage};
pub use file::FileCacheStorage;

// Re-export the traits from core
pub use keel_core::traits::{Cache, CacheStorage};
