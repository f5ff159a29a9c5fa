//! Worker registration: which worker is installing, waiting and active.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use keel_core::error::Result;
use keel_core::types::{Request, WorkerMessage};

use crate::clients::Clients;
use crate::worker::{FetchOutcome, Worker};

#[derive(Default)]
struct Slots {
    installing: Option<Arc<Worker>>,
    waiting: Option<Arc<Worker>>,
    active: Option<Arc<Worker>>,
}

/// Tracks the workers registered for one scope.
///
/// A newly installed worker waits while another one is active, unless it
/// has asked to skip waiting. Promoting a worker runs its activate step and,
/// once that succeeds, makes the previous active worker redundant.
pub struct Registration {
    clients: Arc<Clients>,
    slots: RwLock<Slots>,
}

impl Registration {
    /// Creates an empty registration sharing `clients` with its workers.
    pub fn new(clients: Arc<Clients>) -> Self {
        Self {
            clients,
            slots: RwLock::new(Slots::default()),
        }
    }

    /// Clients of this scope.
    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    /// Opens a new client, controlled by the active worker if there is one.
    pub fn connect_client(&self) -> Uuid {
        let controller = self.active().map(|w| w.id());
        self.clients.connect(controller)
    }

    /// The worker handling fetches.
    pub fn active(&self) -> Option<Arc<Worker>> {
        self.slots.read().active.clone()
    }

    /// The installed worker waiting to take over.
    pub fn waiting(&self) -> Option<Arc<Worker>> {
        self.slots.read().waiting.clone()
    }

    /// The worker currently installing.
    pub fn installing(&self) -> Option<Arc<Worker>> {
        self.slots.read().installing.clone()
    }

    /// Installs `worker`, then activates it or leaves it waiting.
    ///
    /// An install failure is returned and the previous workers stay in place.
    #[instrument(skip(self, worker), fields(worker = %worker.id()))]
    pub async fn register(&self, worker: Arc<Worker>) -> Result<()> {
        if let Some(previous) = self.slots.write().installing.replace(worker.clone()) {
            previous.mark_redundant();
        }

        let installed = worker.install().await;
        self.slots.write().installing = None;
        installed?;

        let has_active = self.slots.read().active.is_some();
        if !has_active || worker.skip_waiting_requested() {
            return self.promote(worker).await;
        }

        info!("Installed, waiting for the active worker to be released");
        if let Some(previous) = self.slots.write().waiting.replace(worker) {
            previous.mark_redundant();
        }
        Ok(())
    }

    /// Activates the waiting worker if it asked to skip waiting.
    ///
    /// Returns true if a worker was promoted.
    pub async fn update(&self) -> Result<bool> {
        let ready = {
            let mut slots = self.slots.write();
            match slots.waiting.as_ref() {
                Some(w) if w.skip_waiting_requested() => slots.waiting.take(),
                _ => None,
            }
        };

        match ready {
            Some(worker) => {
                self.promote(worker).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Activates `worker`; the previous active worker is retired only once that succeeds.
    async fn promote(&self, worker: Arc<Worker>) -> Result<()> {
        // Pending refreshes of the old worker must land before its cache is deleted
        if let Some(previous) = self.active() {
            previous.settle().await;
        }

        if let Err(err) = worker.activate().await {
            warn!(error = %err, "Activation failed, keeping the current worker");
            return Err(err);
        }

        let previous = self.slots.write().active.replace(worker);
        if let Some(previous) = previous {
            previous.mark_redundant();
        }
        Ok(())
    }

    /// Delivers a client message to the waiting worker, or the active one.
    ///
    /// A waiting worker that asks to skip waiting is promoted immediately.
    pub async fn post_message(&self, payload: &serde_json::Value) -> Result<Option<WorkerMessage>> {
        let target = {
            let slots = self.slots.read();
            slots.waiting.clone().or_else(|| slots.active.clone())
        };

        let Some(worker) = target else {
            return Ok(None);
        };

        let message = worker.handle_message(payload);
        if message.is_some() {
            self.update().await?;
        }
        Ok(message)
    }

    /// Routes a request to the active worker.
    ///
    /// With no active worker the request passes through untouched.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome> {
        match self.active() {
            Some(worker) => worker.handle_fetch(request).await,
            None => Ok(FetchOutcome::Passthrough),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read();
        f.debug_struct("Registration")
            .field("installing", &slots.installing.as_ref().map(|w| w.id()))
            .field("waiting", &slots.waiting.as_ref().map(|w| w.id()))
            .field("active", &slots.active.as_ref().map(|w| w.id()))
            .field("clients", &self.clients.len())
            .finish()
    }
}
