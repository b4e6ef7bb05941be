//! Error types for the game layer.
//!
//! Illegal moves are not errors here: the session reports them as absent
//! results. These types cover the two places where a hard failure is the
//! right answer.

/// Why a die could not be placed on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("row {0} does not exist")]
    RowOutOfRange(usize),

    #[error("row {0} is full")]
    RowFull(usize),
}

/// A zone descriptor that cannot be turned into a zone.
///
/// Raised at construction time and treated as fatal by the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZoneError {
    #[error("malformed zone {name:?}: {reason}")]
    MalformedZone { name: String, reason: String },
}
