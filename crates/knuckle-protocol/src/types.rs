//! Identity types and client requests for the Knucklebones wire format.
//!
//! These are the values that cross the boundary between the authoritative
//! session and the observers mirroring it. Identifiers are opaque strings
//! handed to us by the host; the core never interprets them.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque identifier for a participant in the town.
///
/// A newtype over the host's string id, so a `SessionId` can never be
/// passed where a participant is expected. `#[serde(transparent)]` keeps
/// the wire form a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps a host-provided identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An identifier for one game session (one zone on the town map).
///
/// The session id is the zone's name from the map, so it is stable for the
/// lifetime of the server.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a zone name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Display data for a participant, resolved from the host's directory.
///
/// Only ever used to enrich snapshots. Rule enforcement works on bare
/// [`ParticipantId`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub id: ParticipantId,
    pub user_name: String,
}

// ---------------------------------------------------------------------------
// Request — what an observer may ask the session to do
// ---------------------------------------------------------------------------

/// An action request sent from a client to the authoritative session.
///
/// Requests are fire-and-forget: the only visible outcome is the next
/// snapshot, or no snapshot at all if the session rejected the request.
///
/// Internally tagged, so `Request::Place { row: 2 }` travels as
/// `{ "type": "Place", "row": 2 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Start the game once both player seats are filled.
    Start,
    /// Roll the die for the current turn.
    Roll,
    /// Place the pending die into one of the acting player's rows (0..=2).
    Place { row: usize },
}
