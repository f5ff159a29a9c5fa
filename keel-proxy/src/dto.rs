//! DTOs for the `/__keel` control endpoints.

use serde::Serialize;

/// Response for the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server is up
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Upstream origin
    pub origin: String,
    /// Cache owned by the active worker
    pub cache_name: String,
    /// Active worker, if any
    pub active: Option<WorkerDto>,
    /// Worker waiting to take over, if any
    pub waiting: Option<WorkerDto>,
}

/// A registered worker.
#[derive(Debug, Serialize)]
pub struct WorkerDto {
    /// Worker id
    pub id: String,
    /// Lifecycle state
    pub state: String,
    /// Cache the worker owns
    pub cache_name: String,
}

impl From<&keel_worker::Worker> for WorkerDto {
    fn from(worker: &keel_worker::Worker) -> Self {
        Self {
            id: worker.id().to_string(),
            state: worker.state().to_string(),
            cache_name: worker.cache_name().to_string(),
        }
    }
}

/// Response for a posted message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Whether a worker recognised the message
    pub accepted: bool,
    /// Active worker after the message was handled
    pub active: Option<WorkerDto>,
}

/// One cache and its size.
#[derive(Debug, Serialize)]
pub struct CacheSummary {
    /// Cache name
    pub name: String,
    /// Number of stored entries
    pub entries: usize,
}

/// Response for listing caches.
#[derive(Debug, Serialize)]
pub struct CachesResponse {
    /// Every cache in storage
    pub caches: Vec<CacheSummary>,
}
