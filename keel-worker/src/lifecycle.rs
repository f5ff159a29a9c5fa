//! Worker lifecycle states.

use std::fmt;

use serde::Serialize;

use keel_core::error::{KeelError, Result};

/// Where a worker is in its lifecycle.
///
/// ```text
/// Parsed → Installing → Installed → Activating → Activated
///             │             │            │
///             └─────────────┴────────────┴──→ Redundant
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, nothing run yet.
    Parsed,
    /// Pre-populating the cache.
    Installing,
    /// Installed; waiting to take over.
    Installed,
    /// Removing old caches and claiming clients.
    Activating,
    /// Handling fetches.
    Activated,
    /// Failed or replaced; never used again.
    Redundant,
}

impl WorkerState {
    /// Lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    /// Returns true if `next` is reachable in one step.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Redundant, _) => false,
            (_, Redundant) => true,
            (Parsed, Installing)
            | (Installing, Installed)
            | (Installed, Activating)
            | (Activating, Activated) => true,
            _ => false,
        }
    }

    /// Validates and returns `next`.
    pub fn transition(&self, next: WorkerState) -> Result<WorkerState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(KeelError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = WorkerState::Parsed;
        for next in [
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
        ] {
            state = state.transition(next).unwrap();
        }
        assert_eq!(state, WorkerState::Activated);
    }

    #[test]
    fn test_skipping_states_rejected() {
        assert!(WorkerState::Parsed.transition(WorkerState::Activated).is_err());
        assert!(WorkerState::Installing.transition(WorkerState::Activating).is_err());
        assert!(WorkerState::Activated.transition(WorkerState::Installing).is_err());
    }

    #[test]
    fn test_redundant_is_terminal() {
        assert!(WorkerState::Installing.can_transition_to(WorkerState::Redundant));
        assert!(WorkerState::Activated.can_transition_to(WorkerState::Redundant));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Redundant));
    }
}
