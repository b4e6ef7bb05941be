//! The wire-shaped snapshot of a session and the update envelope that
//! carries it to subscribers.
//!
//! A snapshot is a full, self-describing copy of session state. Every
//! emission carries one, so a subscriber that misses or reorders deliveries
//! converges as soon as the next one arrives.

use serde::{Deserialize, Serialize};

use crate::{ParticipantId, ParticipantRecord, ProtocolError, SessionId};

/// A 3x3 board as it travels on the wire. `0` is an empty cell, `1..=6`
/// a placed die face. Rows are the outer index.
pub type BoardGrid = [[u8; 3]; 3];

/// An all-empty board grid.
pub const EMPTY_GRID: BoardGrid = [[0; 3]; 3];

/// Flat copy of one session's observable state.
///
/// Field names follow the browser client's expectations
/// (`sessionID`, `isPlayerOneTurn`, ...). Optional fields are omitted
/// from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "sessionID")]
    pub session_id: SessionId,

    /// Everyone inside the zone, in arrival order.
    #[serde(rename = "occupantIDs")]
    pub occupant_ids: Vec<ParticipantId>,

    #[serde(rename = "spectatorIDs")]
    pub spectator_ids: Vec<ParticipantId>,

    #[serde(
        rename = "playerOneID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub player_one_id: Option<ParticipantId>,

    #[serde(
        rename = "playerTwoID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub player_two_id: Option<ParticipantId>,

    #[serde(rename = "boardOne")]
    pub board_one: BoardGrid,

    #[serde(rename = "boardTwo")]
    pub board_two: BoardGrid,

    pub running: bool,

    #[serde(rename = "isPlayerOneTurn")]
    pub is_player_one_turn: bool,

    #[serde(
        rename = "pendingDie",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pending_die: Option<u8>,

    /// Resolved display records for the players and spectators whose ids
    /// the directory knew about.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<ParticipantRecord>,
}

impl Snapshot {
    /// The snapshot of a freshly created, unoccupied session.
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            occupant_ids: Vec::new(),
            spectator_ids: Vec::new(),
            player_one_id: None,
            player_two_id: None,
            board_one: EMPTY_GRID,
            board_two: EMPTY_GRID,
            running: false,
            is_player_one_turn: true,
            pending_die: None,
            participants: Vec::new(),
        }
    }

    /// Checks the value ranges a decoded snapshot must respect.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if a cell is outside
    /// `0..=6` or the pending die is outside `1..=6`.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        for (name, grid) in [("boardOne", &self.board_one), ("boardTwo", &self.board_two)] {
            if let Some(cell) = grid.iter().flatten().find(|c| **c > 6) {
                return Err(ProtocolError::InvalidMessage(format!(
                    "{name} contains out-of-range cell {cell}"
                )));
            }
        }
        if let Some(die) = self.pending_die {
            if !(1..=6).contains(&die) {
                return Err(ProtocolError::InvalidMessage(format!(
                    "pending die {die} is not a die face"
                )));
            }
        }
        Ok(())
    }

    /// Lists the fields whose values differ between `self` and `newer`,
    /// in declaration order. The session id is not compared.
    pub fn diff(&self, newer: &Snapshot) -> Vec<SnapshotField> {
        let mut changed = Vec::new();
        if self.occupant_ids != newer.occupant_ids {
            changed.push(SnapshotField::Occupants);
        }
        if self.spectator_ids != newer.spectator_ids {
            changed.push(SnapshotField::Spectators);
        }
        if self.player_one_id != newer.player_one_id {
            changed.push(SnapshotField::PlayerOne);
        }
        if self.player_two_id != newer.player_two_id {
            changed.push(SnapshotField::PlayerTwo);
        }
        if self.board_one != newer.board_one {
            changed.push(SnapshotField::BoardOne);
        }
        if self.board_two != newer.board_two {
            changed.push(SnapshotField::BoardTwo);
        }
        if self.running != newer.running {
            changed.push(SnapshotField::Running);
        }
        if self.is_player_one_turn != newer.is_player_one_turn {
            changed.push(SnapshotField::Turn);
        }
        if self.pending_die != newer.pending_die {
            changed.push(SnapshotField::PendingDie);
        }
        if self.participants != newer.participants {
            changed.push(SnapshotField::Participants);
        }
        changed
    }
}

/// Names one observable field of a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotField {
    Occupants,
    Spectators,
    PlayerOne,
    PlayerTwo,
    BoardOne,
    BoardTwo,
    Running,
    Turn,
    PendingDie,
    Participants,
}

/// One emission from the authoritative session to a subscriber.
///
/// `changed` is what the server observed against its previous emission.
/// Receivers that may have missed deliveries should diff against their own
/// cache instead of trusting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Per-session emission counter. Emissions count from 1; the update
    /// sent on subscribe repeats the current count, which is 0 if nothing
    /// has been emitted yet.
    pub seq: u64,
    pub changed: Vec<SnapshotField>,
    pub snapshot: Snapshot,
}
