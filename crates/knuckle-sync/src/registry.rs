//! Session registry: spawns hubs, tracks them, and routes host callbacks
//! and client requests to the right one.

use std::collections::HashMap;
use std::sync::Arc;

use knuckle_game::{Departure, JoinOutcome, Session};
use knuckle_protocol::{ParticipantId, Request, SessionId, Snapshot};

use crate::hub::spawn_hub;
use crate::{
    HubHandle, ParticipantDirectory, ParticipantLink, SessionInfo,
    SubscriptionId, SyncConfig, SyncError, UpdateSender,
};

/// All live sessions, plus which session each participant is standing in.
///
/// A participant occupies at most one session at a time: the host must
/// report leaving one zone before entering another.
pub struct SessionRegistry {
    hubs: HashMap<SessionId, HubHandle>,

    /// Participant → the session they currently occupy.
    occupancy: HashMap<ParticipantId, SessionId>,

    directory: Arc<dyn ParticipantDirectory>,
    config: SyncConfig,
}

impl SessionRegistry {
    /// An empty registry resolving display records through `directory`.
    pub fn new(directory: Arc<dyn ParticipantDirectory>, config: SyncConfig) -> Self {
        Self {
            hubs: HashMap::new(),
            occupancy: HashMap::new(),
            directory,
            config,
        }
    }

    /// Spawns a hub for `session` and registers it under the session's id.
    ///
    /// # Errors
    /// [`SyncError::DuplicateSession`] if the id is taken.
    pub fn open_session(&mut self, session: Session) -> Result<SessionId, SyncError> {
        let session_id = session.id().clone();
        if self.hubs.contains_key(&session_id) {
            return Err(SyncError::DuplicateSession(session_id));
        }
        let handle = spawn_hub(session, Arc::clone(&self.directory), &self.config);
        self.hubs.insert(session_id.clone(), handle);
        tracing::info!(%session_id, "session opened");
        Ok(session_id)
    }

    /// Host callback: `participant` entered the zone of `session_id`.
    ///
    /// # Errors
    /// [`SyncError::NotFound`] for an unknown session,
    /// [`SyncError::AlreadyInSession`] if they still occupy another one.
    pub async fn on_participant_enter(
        &mut self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<JoinOutcome, SyncError> {
        if let Some(current) = self.occupancy.get(&participant) {
            if current != session_id {
                return Err(SyncError::AlreadyInSession(participant, current.clone()));
            }
        }
        let handle = self.hub(session_id)?;
        let outcome = handle.enter(participant.clone()).await?;
        self.occupancy.insert(participant, session_id.clone());
        Ok(outcome)
    }

    /// Host callback: `participant` left the zone of `session_id`.
    ///
    /// Leaving a session one is not in is a no-op returning `Ok(None)`.
    pub async fn on_participant_leave(
        &mut self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<Option<Departure>, SyncError> {
        let handle = self.hub(session_id)?;
        let departure = handle.leave(participant.clone()).await?;
        if self.occupancy.get(&participant) == Some(session_id) {
            self.occupancy.remove(&participant);
        }
        Ok(departure)
    }

    /// Forwards an action request from `participant` to a session.
    pub async fn request(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
        request: Request,
    ) -> Result<(), SyncError> {
        self.hub(session_id)?.request(participant, request).await
    }

    /// Adds a subscriber to a session's update feed.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
        sender: UpdateSender,
    ) -> Result<SubscriptionId, SyncError> {
        self.hub(session_id)?.subscribe(sender).await
    }

    /// Drops a subscriber. `Ok(false)` if it was already gone.
    pub async fn unsubscribe(
        &self,
        session_id: &SessionId,
        id: SubscriptionId,
    ) -> Result<bool, SyncError> {
        self.hub(session_id)?.unsubscribe(id).await
    }

    /// The session's current snapshot.
    pub async fn snapshot(&self, session_id: &SessionId) -> Result<Snapshot, SyncError> {
        self.hub(session_id)?.snapshot().await
    }

    /// Summary of one session.
    pub async fn info(&self, session_id: &SessionId) -> Result<SessionInfo, SyncError> {
        self.hub(session_id)?.info().await
    }

    /// Lists every session that answers, sorted by id. Sessions that fail
    /// to respond are skipped.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut infos = Vec::with_capacity(self.hubs.len());
        for handle in self.hubs.values() {
            if let Ok(info) = handle.info().await {
                infos.push(info);
            }
        }
        infos.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        infos
    }

    /// A request path for `participant` into `session_id`, for building a
    /// client mirror.
    pub fn link(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<ParticipantLink, SyncError> {
        Ok(ParticipantLink::new(self.hub(session_id)?.clone(), participant))
    }

    /// Stops a session's hub and forgets everyone who was in it.
    pub async fn close_session(&mut self, session_id: &SessionId) -> Result<(), SyncError> {
        let handle = self
            .hubs
            .remove(session_id)
            .ok_or_else(|| SyncError::NotFound(session_id.clone()))?;
        let _ = handle.shutdown().await;
        self.occupancy.retain(|_, sid| sid != session_id);
        tracing::info!(%session_id, "session closed");
        Ok(())
    }

    /// The session `participant` currently occupies, if any.
    pub fn session_of(&self, participant: &ParticipantId) -> Option<&SessionId> {
        self.occupancy.get(participant)
    }

    /// The hub handle for a session, if it is open.
    pub fn handle(&self, session_id: &SessionId) -> Option<&HubHandle> {
        self.hubs.get(session_id)
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.hubs.len()
    }

    /// Ids of every open session.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.hubs.keys().cloned().collect()
    }

    fn hub(&self, session_id: &SessionId) -> Result<&HubHandle, SyncError> {
        self.hubs
            .get(session_id)
            .ok_or_else(|| SyncError::NotFound(session_id.clone()))
    }
}
