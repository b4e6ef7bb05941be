//! Error types for the synchronization layer.

use knuckle_protocol::{ParticipantId, ProtocolError, SessionId};

/// Errors from routing to session actors and mirroring their state.
///
/// Rejected game actions never show up here; they simply produce no
/// update.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No session is registered under this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A session with this id is already registered.
    #[error("session {0} already exists")]
    DuplicateSession(SessionId),

    /// The participant occupies a different session and must leave it
    /// first.
    #[error("participant {0} is already in session {1}")]
    AlreadyInSession(ParticipantId, SessionId),

    /// The session actor has stopped or its channel is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),

    /// The request path back to the server is gone.
    #[error("request channel closed")]
    Disconnected,

    /// An update for another session reached this mirror.
    #[error("update for session {got} delivered to mirror of {expected}")]
    SessionMismatch { expected: SessionId, got: SessionId },

    /// An update could not be decoded or failed validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
