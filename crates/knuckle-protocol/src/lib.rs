//! Wire protocol for Knucklebones sessions.
//!
//! This crate defines what travels between the authoritative session and
//! the observers mirroring it:
//!
//! - **Identity** ([`ParticipantId`], [`SessionId`], [`ParticipantRecord`])
//! - **State** ([`Snapshot`], [`SnapshotField`], [`Update`]) — full copies of
//!   session state, never diffs
//! - **Intent** ([`Request`]) — what a client may ask for
//! - **Codec** ([`Codec`], [`JsonCodec`]) — bytes in, bytes out
//!
//! It knows nothing about rules or actors.

mod codec;
mod error;
mod snapshot;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use snapshot::{BoardGrid, EMPTY_GRID, Snapshot, SnapshotField, Update};
pub use types::{ParticipantId, ParticipantRecord, Request, SessionId};
