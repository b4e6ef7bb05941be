//! The embedding surface for a shared virtual space.
//!
//! [`TownHost`] owns the session registry for one town. The surrounding
//! server reports avatar movement through [`TownHost::enter`],
//! [`TownHost::leave`] or [`TownHost::move_participant`], forwards client
//! requests with [`TownHost::request`], and wires each client's update
//! feed with [`TownHost::subscribe`].

use std::sync::Arc;

use knuckle_game::{Departure, JoinOutcome, Session};
use knuckle_protocol::{ParticipantId, Request, SessionId, Snapshot, Update};
use knuckle_sync::{
    ParticipantDirectory, ParticipantLink, SessionController, SessionInfo, SessionRegistry,
    SubscriptionId, SyncConfig, SyncError,
};
use tokio::sync::{Mutex, mpsc};

use crate::{KnuckleError, TownConfig};

/// A receiver for one subscription's updates.
pub type UpdateReceiver = mpsc::UnboundedReceiver<Update>;

/// Every Knucklebones session in one town.
///
/// Construct it from inside a Tokio runtime: each session is spawned as
/// its own task.
pub struct TownHost {
    registry: Mutex<SessionRegistry>,
}

impl TownHost {
    /// Opens one session per game area on the town map.
    ///
    /// # Errors
    /// [`KnuckleError::Zone`] for a malformed area, or
    /// [`KnuckleError::Sync`] if two areas share a name. Both are fatal:
    /// no host is returned.
    pub fn new(
        config: &TownConfig,
        directory: Arc<dyn ParticipantDirectory>,
    ) -> Result<Self, KnuckleError> {
        Self::from_sessions(config.sessions()?, directory, config.sync.clone())
    }

    /// Opens the given sessions, for callers that build their own (for
    /// example with a fixed die sequence).
    pub fn from_sessions(
        sessions: impl IntoIterator<Item = Session>,
        directory: Arc<dyn ParticipantDirectory>,
        sync: SyncConfig,
    ) -> Result<Self, KnuckleError> {
        let mut registry = SessionRegistry::new(directory, sync);
        for session in sessions {
            registry.open_session(session)?;
        }
        tracing::info!(sessions = registry.session_count(), "town host ready");
        Ok(Self {
            registry: Mutex::new(registry),
        })
    }

    /// `participant` walked into the zone of `session_id`.
    pub async fn enter(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<JoinOutcome, KnuckleError> {
        let mut registry = self.registry.lock().await;
        Ok(registry.on_participant_enter(session_id, participant).await?)
    }

    /// `participant` walked out of the zone of `session_id`.
    pub async fn leave(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<Option<Departure>, KnuckleError> {
        let mut registry = self.registry.lock().await;
        Ok(registry.on_participant_leave(session_id, participant).await?)
    }

    /// Moves `participant` to the zone `to`, or out of every zone for
    /// `None`, leaving their current zone first.
    ///
    /// Returns the new role, if they entered a zone.
    ///
    /// # Errors
    /// [`SyncError::NotFound`] if `to` names no session. Nothing changes
    /// in that case, and the participant stays where they were.
    pub async fn move_participant(
        &self,
        participant: ParticipantId,
        to: Option<&SessionId>,
    ) -> Result<Option<JoinOutcome>, KnuckleError> {
        let mut registry = self.registry.lock().await;
        if let Some(target) = to {
            if registry.handle(target).is_none() {
                return Err(SyncError::NotFound(target.clone()).into());
            }
        }
        if let Some(current) = registry.session_of(&participant).cloned() {
            if Some(&current) == to {
                let outcome = registry.on_participant_enter(&current, participant).await?;
                return Ok(Some(outcome));
            }
            registry
                .on_participant_leave(&current, participant.clone())
                .await?;
        }
        match to {
            Some(session_id) => Ok(Some(
                registry.on_participant_enter(session_id, participant).await?,
            )),
            None => Ok(None),
        }
    }

    /// Forwards an action request. Illegal requests are dropped silently.
    pub async fn request(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
        request: Request,
    ) -> Result<(), KnuckleError> {
        let registry = self.registry.lock().await;
        Ok(registry.request(session_id, participant, request).await?)
    }

    /// Subscribes to a session. The receiver holds the current state
    /// immediately, then every later change.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> Result<(SubscriptionId, UpdateReceiver), KnuckleError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = self.registry.lock().await;
        let id = registry.subscribe(session_id, tx).await?;
        Ok((id, rx))
    }

    /// Ends a subscription. Returns `false` if it was already gone.
    pub async fn unsubscribe(
        &self,
        session_id: &SessionId,
        id: SubscriptionId,
    ) -> Result<bool, KnuckleError> {
        let registry = self.registry.lock().await;
        Ok(registry.unsubscribe(session_id, id).await?)
    }

    /// Returns the session's current snapshot.
    pub async fn snapshot(&self, session_id: &SessionId) -> Result<Snapshot, KnuckleError> {
        let registry = self.registry.lock().await;
        Ok(registry.snapshot(session_id).await?)
    }

    /// A client mirror for `participant`, seeded with the current state and
    /// sending its requests straight to the session.
    pub async fn controller(
        &self,
        session_id: &SessionId,
        participant: ParticipantId,
    ) -> Result<SessionController<ParticipantLink>, KnuckleError> {
        let registry = self.registry.lock().await;
        let link = registry.link(session_id, participant.clone())?;
        let snapshot = registry.snapshot(session_id).await?;
        Ok(SessionController::new(participant, snapshot, link))
    }

    /// The session `participant` is standing in, if any.
    pub async fn session_of(&self, participant: &ParticipantId) -> Option<SessionId> {
        self.registry.lock().await.session_of(participant).cloned()
    }

    /// Lists every live session, sorted by id.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.registry.lock().await.list_sessions().await
    }

    /// Stops every session.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        for session_id in registry.session_ids() {
            if let Err(error) = registry.close_session(&session_id).await {
                tracing::warn!(%session_id, %error, "failed to close session");
            }
        }
        tracing::info!("town host shut down");
    }
}
