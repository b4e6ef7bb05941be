//! # Knuckle
//!
//! Knucklebones as an embeddable mini-game for shared virtual spaces.
//!
//! Zones on the town map become game sessions. Walking into a zone seats
//! you as a player (first two) or a spectator (everyone after). Players
//! take turns rolling a die and placing it on their own 3x3 board; placing
//! a face knocks every matching die out of the opponent's same row. The
//! server owns all state and pushes full snapshots to every subscriber.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use knuckle::prelude::*;
//!
//! # async fn run() -> Result<(), KnuckleError> {
//! let config = TownConfig::from_path("town.json")?;
//! let host = TownHost::new(&config, Arc::new(InMemoryDirectory::new()))?;
//!
//! let area = SessionId::new("Knuckles1");
//! host.enter(&area, ParticipantId::new("alice")).await?;
//! let (_sub, _updates) = host.subscribe(&area).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod host;
pub mod telemetry;

pub use config::{GAME_AREA_TYPE, MapLayer, MapObject, TownConfig};
pub use error::KnuckleError;
pub use host::{TownHost, UpdateReceiver};

pub use knuckle_game as game;
pub use knuckle_protocol as protocol;
pub use knuckle_sync as sync;

pub mod prelude {
    pub use crate::{KnuckleError, TownConfig, TownHost};
    pub use knuckle_game::{
        DieFace, DieRoller, JoinOutcome, Phase, RandomRoller, Role, Seat, SequenceRoller,
        Session, Zone,
    };
    pub use knuckle_protocol::{
        Codec, JsonCodec, ParticipantId, ParticipantRecord, Request, SessionId, Snapshot,
        SnapshotField, Update,
    };
    pub use knuckle_sync::{
        Change, InMemoryDirectory, ParticipantDirectory, SessionController, SyncConfig,
    };
}
