//! Pages a worker can control.

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Open clients and the worker controlling each one.
#[derive(Debug, Default)]
pub struct Clients {
    /// Client id → controlling worker id
    clients: DashMap<Uuid, Option<Uuid>>,
}

impl Clients {
    /// Creates an empty client set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client, optionally already controlled by `controller`.
    pub fn connect(&self, controller: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.insert(id, controller);
        id
    }

    /// Removes a client. Returns true if it was known.
    pub fn disconnect(&self, id: Uuid) -> bool {
        self.clients.remove(&id).is_some()
    }

    /// Returns the worker controlling `client`.
    pub fn controller(&self, client: Uuid) -> Option<Uuid> {
        self.clients.get(&client).and_then(|entry| *entry.value())
    }

    /// Makes `worker` the controller of every client. Returns how many changed hands.
    pub fn claim(&self, worker: Uuid) -> usize {
        let mut changed = 0;
        for mut entry in self.clients.iter_mut() {
            if *entry.value() != Some(worker) {
                *entry.value_mut() = Some(worker);
                changed += 1;
            }
        }
        debug!(%worker, changed, "Claimed clients");
        changed
    }

    /// Number of clients controlled by `worker`.
    pub fn controlled_by(&self, worker: Uuid) -> usize {
        self.clients
            .iter()
            .filter(|entry| *entry.value() == Some(worker))
            .count()
    }

    /// Number of open clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no client is open.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_takes_all_clients() {
        let clients = Clients::new();
        let old_worker = Uuid::new_v4();
        let new_worker = Uuid::new_v4();

        let a = clients.connect(None);
        let b = clients.connect(Some(old_worker));

        assert_eq!(clients.claim(new_worker), 2);
        assert_eq!(clients.controller(a), Some(new_worker));
        assert_eq!(clients.controller(b), Some(new_worker));
        assert_eq!(clients.controlled_by(old_worker), 0);

        // Claiming again changes nothing
        assert_eq!(clients.claim(new_worker), 0);
    }

    #[test]
    fn test_disconnect() {
        let clients = Clients::new();
        let id = clients.connect(None);
        assert!(clients.disconnect(id));
        assert!(!clients.disconnect(id));
        assert!(clients.is_empty());
    }
}
