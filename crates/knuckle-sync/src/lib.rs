//! Synchronization layer for Knucklebones sessions.
//!
//! Each session runs as a Tokio task ("hub") that owns the authoritative
//! [`Session`](knuckle_game::Session). The host reports zone entry and
//! exit, clients send [`Request`](knuckle_protocol::Request)s, and after
//! every call that changed state the hub pushes a full snapshot to each
//! subscriber. Rejected requests produce nothing.
//!
//! # Architecture
//!
//! ```text
//! host / clients
//!       │
//! SessionRegistry ── routes by SessionId, one session per participant
//!       │
//!   HubHandle ──mpsc──→ hub task (owns Session, diffs, broadcasts)
//!                              │
//!                     Update { seq, changed, snapshot }
//!                              │
//!                   SessionController (client mirror)
//! ```

mod client;
mod config;
mod directory;
mod error;
mod hub;
mod registry;

pub use client::{
    Change, ChangeStream, ParticipantLink, RequestSink, SessionController,
};
pub use config::SyncConfig;
pub use directory::{InMemoryDirectory, ParticipantDirectory};
pub use error::SyncError;
pub use hub::{HubHandle, SessionInfo, SubscriptionId, UpdateSender};
pub use registry::SessionRegistry;
