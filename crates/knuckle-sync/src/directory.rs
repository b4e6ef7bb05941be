//! Participant lookup used to enrich snapshots with display data.
//!
//! The host owns the town-wide directory; sessions only ever ask it to
//! resolve an id. A missing record is not an error, the participant is
//! just left out of the snapshot's `participants` list.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use knuckle_protocol::{ParticipantId, ParticipantRecord};

/// Resolves opaque participant ids to display records.
///
/// Called from inside session actors, so it must not block for long.
pub trait ParticipantDirectory: Send + Sync + 'static {
    fn resolve(&self, participant: &ParticipantId) -> Option<ParticipantRecord>;
}

/// A directory backed by a map the host keeps up to date.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    records: RwLock<HashMap<ParticipantId, ParticipantRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record.
    pub fn insert(&self, record: ParticipantRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id.clone(), record);
    }

    /// Forgets a participant. Returns their record if one was present.
    pub fn remove(&self, participant: &ParticipantId) -> Option<ParticipantRecord> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(participant)
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParticipantDirectory for InMemoryDirectory {
    fn resolve(&self, participant: &ParticipantId) -> Option<ParticipantRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(participant)
            .cloned()
    }
}
