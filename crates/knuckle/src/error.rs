//! Unified error type for the Knuckle crates.

use knuckle_game::ZoneError;
use knuckle_protocol::ProtocolError;
use knuckle_sync::SyncError;

/// Top-level error wrapping every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors
/// automatically. Rejected moves never reach this type: the session
/// reports them as absent results, so `PlaceError` stays in the game
/// crate.
#[derive(Debug, thiserror::Error)]
pub enum KnuckleError {
    /// Encode, decode, or snapshot validation failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A town map zone could not be turned into a session.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Routing failure: unknown or stopped session, duplicate ids.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The town map is not valid JSON or has the wrong shape.
    #[error("invalid town map: {0}")]
    Map(#[from] serde_json::Error),

    #[error("failed to read town map: {0}")]
    Io(#[from] std::io::Error),
}
