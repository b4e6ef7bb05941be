//! Session hub: an isolated Tokio task that owns one [`Session`].
//!
//! Every mutation goes through the hub's command channel, so a session
//! processes one call at a time. After each call that changed observable
//! state the hub builds a snapshot and pushes it to every subscriber.
//! Delivery is fire-and-forget: a subscriber whose channel is gone is
//! dropped and the session carries on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use knuckle_game::{Departure, JoinOutcome, Phase, Seat, Session};
use knuckle_protocol::{ParticipantId, Request, SessionId, Snapshot, Update};
use tokio::sync::{mpsc, oneshot};

use crate::{ParticipantDirectory, SyncConfig, SyncError};

/// Channel sender for delivering updates to one subscriber.
pub type UpdateSender = mpsc::UnboundedSender<Update>;

/// Identifies one subscription within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Commands sent to a hub through its channel. The `oneshot::Sender`s are
/// reply channels.
pub(crate) enum HubCommand {
    Enter {
        participant: ParticipantId,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        participant: ParticipantId,
        reply: oneshot::Sender<Option<Departure>>,
    },
    Request {
        sender: ParticipantId,
        request: Request,
    },
    Subscribe {
        sender: UpdateSender,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    GetSnapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    GetInfo {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown,
}

/// Session metadata, for listings and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub phase: Phase,
    pub occupant_count: usize,
    pub subscriber_count: usize,
    /// Sequence number of the last emitted update (0 before the first).
    pub seq: u64,
}

/// Handle to a running hub. Cheap to clone.
#[derive(Clone)]
pub struct HubHandle {
    session_id: SessionId,
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// The session this hub owns.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Admits a participant to the session.
    pub async fn enter(&self, participant: ParticipantId) -> Result<JoinOutcome, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Enter { participant, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a participant. `Ok(None)` if they were not inside.
    pub async fn leave(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<Departure>, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Leave { participant, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Forwards an action request (fire-and-forget). The outcome is only
    /// visible through the next update, if any.
    pub async fn request(
        &self,
        sender: ParticipantId,
        request: Request,
    ) -> Result<(), SyncError> {
        self.send(HubCommand::Request { sender, request }).await
    }

    /// Registers a subscriber. It immediately receives the current state as
    /// an update with an empty `changed` list, then every later emission.
    pub async fn subscribe(&self, sender: UpdateSender) -> Result<SubscriptionId, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Subscribe { sender, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Unsubscribe { id, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::GetSnapshot { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Phase, head counts and current `seq` for this session.
    pub async fn info(&self) -> Result<SessionInfo, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::GetInfo { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the hub to stop.
    pub async fn shutdown(&self) -> Result<(), SyncError> {
        self.send(HubCommand::Shutdown).await
    }

    async fn send(&self, command: HubCommand) -> Result<(), SyncError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> SyncError {
        SyncError::Unavailable(self.session_id.clone())
    }
}

/// The actor state. Lives inside the spawned task.
struct HubActor {
    session: Session,
    directory: Arc<dyn ParticipantDirectory>,
    resolve_participants: bool,
    subscribers: HashMap<SubscriptionId, UpdateSender>,
    next_subscription: u64,
    seq: u64,
    /// What subscribers were last told.
    last: Snapshot,
    receiver: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    async fn run(mut self) {
        let session_id = self.session.id().clone();
        tracing::info!(%session_id, "session hub started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                HubCommand::Enter { participant, reply } => {
                    let outcome = self.session.join(participant);
                    if matches!(outcome, JoinOutcome::Joined(_)) {
                        self.publish();
                    }
                    let _ = reply.send(outcome);
                }
                HubCommand::Leave { participant, reply } => {
                    let departure = self.session.leave(&participant);
                    if departure.is_some() {
                        self.publish();
                    }
                    let _ = reply.send(departure);
                }
                HubCommand::Request { sender, request } => {
                    if self.apply_request(&sender, request) {
                        self.publish();
                    }
                }
                HubCommand::Subscribe { sender, reply } => {
                    let id = self.add_subscriber(sender);
                    let _ = reply.send(id);
                }
                HubCommand::Unsubscribe { id, reply } => {
                    let removed = self.subscribers.remove(&id).is_some();
                    tracing::debug!(%session_id, subscription = %id, removed, "unsubscribed");
                    let _ = reply.send(removed);
                }
                HubCommand::GetSnapshot { reply } => {
                    let _ = reply.send(self.last.clone());
                }
                HubCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                HubCommand::Shutdown => {
                    tracing::info!(%session_id, "session hub shutting down");
                    break;
                }
            }
        }

        tracing::info!(%session_id, "session hub stopped");
    }

    /// Runs a client request through the rules. Returns `true` if state
    /// changed.
    fn apply_request(&mut self, sender: &ParticipantId, request: Request) -> bool {
        if !self.session.zone().contains(sender) {
            tracing::warn!(
                session_id = %self.session.id(),
                %sender,
                "request from non-occupant, ignoring"
            );
            return false;
        }
        match request {
            Request::Start => self.session.start(),
            Request::Roll => self.session.roll_die(sender).is_some(),
            Request::Place { row } => self.session.place_die(sender, row).is_some(),
        }
    }

    fn add_subscriber(&mut self, sender: UpdateSender) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);

        let initial = Update {
            seq: self.seq,
            changed: Vec::new(),
            snapshot: self.last.clone(),
        };
        if sender.send(initial).is_ok() {
            self.subscribers.insert(id, sender);
            tracing::debug!(session_id = %self.session.id(), subscription = %id, "subscribed");
        }
        id
    }

    /// Emits the current state to every subscriber if it differs from the
    /// last emission.
    fn publish(&mut self) {
        let snapshot = self.build_snapshot();
        let changed = self.last.diff(&snapshot);
        if changed.is_empty() {
            return;
        }
        self.seq += 1;
        let update = Update {
            seq: self.seq,
            changed,
            snapshot: snapshot.clone(),
        };
        self.last = snapshot;

        let session_id = self.session.id();
        self.subscribers.retain(|id, sender| {
            let delivered = sender.send(update.clone()).is_ok();
            if !delivered {
                tracing::debug!(%session_id, subscription = %id, "subscriber gone, dropping");
            }
            delivered
        });
    }

    /// The session's snapshot, with participant records filled in for
    /// players first and then spectators.
    fn build_snapshot(&self) -> Snapshot {
        let mut snapshot = self.session.snapshot();
        if self.resolve_participants {
            let roster = self.session.roster();
            snapshot.participants = [Seat::One, Seat::Two]
                .into_iter()
                .filter_map(|seat| roster.player(seat))
                .chain(roster.spectators())
                .filter_map(|id| self.directory.resolve(id))
                .collect();
        }
        snapshot
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session.id().clone(),
            phase: self.session.phase(),
            occupant_count: self.session.zone().occupants().len(),
            subscriber_count: self.subscribers.len(),
            seq: self.seq,
        }
    }
}

/// Spawns a hub task for `session` and returns a handle to it.
pub(crate) fn spawn_hub(
    session: Session,
    directory: Arc<dyn ParticipantDirectory>,
    config: &SyncConfig,
) -> HubHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let session_id = session.id().clone();

    let mut actor = HubActor {
        session,
        directory,
        resolve_participants: config.resolve_participants,
        subscribers: HashMap::new(),
        next_subscription: 0,
        seq: 0,
        last: Snapshot::empty(session_id.clone()),
        receiver: rx,
    };
    actor.last = actor.build_snapshot();

    tokio::spawn(actor.run());

    HubHandle {
        session_id,
        sender: tx,
    }
}
