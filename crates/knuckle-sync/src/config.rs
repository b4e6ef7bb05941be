//! Synchronization layer configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every session actor a registry spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Capacity of each session actor's command channel. Callers wait when
    /// it is full.
    pub channel_size: usize,

    /// Whether snapshots carry resolved participant records.
    pub resolve_participants: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            resolve_participants: true,
        }
    }
}
