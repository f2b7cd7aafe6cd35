//! Action capabilities model

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vigil_api::ActionKind;

/// Describes which power actions an executor can perform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCapabilities {
    /// Actions this host can perform
    pub supported: HashSet<ActionKind>,
}

impl ActionCapabilities {
    /// Create minimal capabilities (screen lock only)
    pub fn minimal() -> Self {
        let mut supported = HashSet::new();
        supported.insert(ActionKind::Lock);
        Self { supported }
    }

    /// Create capabilities for a full Linux desktop host
    pub fn linux_full() -> Self {
        let mut supported = HashSet::new();
        supported.insert(ActionKind::Shutdown);
        supported.insert(ActionKind::Sleep);
        supported.insert(ActionKind::Lock);
        Self { supported }
    }

    /// Check if this host can perform the given action
    pub fn supports(&self, action: ActionKind) -> bool {
        self.supported.contains(&action)
    }
}

impl Default for ActionCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}
