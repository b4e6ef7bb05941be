//! Authoritative rules for Knucklebones sessions.
//!
//! Two players take turns rolling a die and placing it on their own 3x3
//! board. Placing a face removes every matching die from the opponent's
//! same row. Anyone else in the zone watches.
//!
//! # Key types
//!
//! - [`Session`] — the state machine that owns everything below
//! - [`Board`] — one player's grid and the capture rule
//! - [`Roster`] — seat and spectator assignment
//! - [`Zone`] — the map region and its occupants
//! - [`DieRoller`] — where rolls come from

mod board;
mod dice;
mod error;
mod roster;
mod session;
mod zone;

pub use board::{Board, COLUMNS, Placement, ROWS};
pub use dice::{DieFace, DieRoller, RandomRoller, SequenceRoller};
pub use error::{PlaceError, ZoneError};
pub use roster::{JoinOutcome, Role, Roster, Seat};
pub use session::{Departure, Phase, Session};
pub use zone::{BoundingBox, Zone, ZoneDescriptor};
