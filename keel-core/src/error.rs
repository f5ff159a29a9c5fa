//! Error types for KEEL.
//!
//! This module provides the error hierarchy shared by every KEEL crate using
//! `thiserror`. Library crates return [`Result`]; binaries wrap it in `anyhow`.

use thiserror::Error;

/// Result type alias using `KeelError`.
pub type Result<T> = std::result::Result<T, KeelError>;

/// Main error type for all KEEL operations.
#[derive(Debug, Error)]
pub enum KeelError {
    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The network request could not be completed.
    #[error("Network request to '{url}' failed: {reason}")]
    Network { url: String, reason: String },

    /// The network did not answer before the deadline.
    #[error("Network timeout after {millis}ms for '{url}'")]
    Timeout { url: String, millis: u64 },

    /// Neither the cache nor the network produced a response.
    #[error("No response available for '{0}'")]
    NoResponse(String),

    /// A fetched response was not usable for caching (non-2xx).
    #[error("Bad response for '{url}': HTTP {status}")]
    BadResponse { url: String, status: u16 },

    // ═══════════════════════════════════════════════════════════════════════════
    // REQUEST ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// Header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Unsupported HTTP method.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Named cache does not exist.
    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    /// Cache storage is corrupted or unusable.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Persisted storage format version mismatch.
    #[error("Storage version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A worker was asked to move to a state it cannot reach from its current one.
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Install did not complete.
    #[error("Install failed: {0}")]
    InstallFailed(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // SYSTEM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl KeelError {
    /// Creates a network error for the given URL.
    pub fn network(url: impl ToString, reason: impl ToString) -> Self {
        KeelError::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeelError::Network { .. } | KeelError::Timeout { .. } | KeelError::BadResponse { .. }
        )
    }

    /// Returns true if the error came from the network side of a request.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            KeelError::Network { .. }
                | KeelError::Timeout { .. }
                | KeelError::NoResponse(_)
                | KeelError::BadResponse { .. }
        )
    }

    /// Returns true if this is a storage error.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            KeelError::CacheNotFound(_)
                | KeelError::StorageError(_)
                | KeelError::VersionMismatch { .. }
                | KeelError::IoError(_)
        )
    }
}
