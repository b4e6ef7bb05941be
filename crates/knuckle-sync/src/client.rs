//! Client-side mirror of one session.
//!
//! A [`SessionController`] caches the last snapshot it received, exposes
//! typed accessors over it, and turns every incoming update into a list of
//! per-field [`Change`]s for whoever is watching. Action requests go out
//! through a [`RequestSink`] and come back, if legal, as the next update.

use std::future::Future;

use knuckle_game::{Role, Seat};
use knuckle_protocol::{
    BoardGrid, Codec, ParticipantId, ParticipantRecord, Request, SessionId, Snapshot,
    SnapshotField, Update,
};
use tokio::sync::mpsc;

use crate::{HubHandle, SyncError};

/// Where a mirror sends its action requests.
pub trait RequestSink: Send + Sync {
    /// Hands a request to the server. Success means it was accepted for
    /// delivery, not that the action was legal.
    fn submit(&self, request: Request) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// A request path straight into a hub, tagged with the requesting
/// participant.
#[derive(Clone)]
pub struct ParticipantLink {
    handle: HubHandle,
    participant: ParticipantId,
}

impl ParticipantLink {
    /// Binds `participant` to the hub behind `handle`.
    pub fn new(handle: HubHandle, participant: ParticipantId) -> Self {
        Self {
            handle,
            participant,
        }
    }

    /// The identity attached to every request.
    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }
}

impl RequestSink for ParticipantLink {
    async fn submit(&self, request: Request) -> Result<(), SyncError> {
        self.handle.request(self.participant.clone(), request).await
    }
}

/// Requests queued on a channel, for transports that attach the sender
/// identity themselves.
impl RequestSink for mpsc::UnboundedSender<Request> {
    async fn submit(&self, request: Request) -> Result<(), SyncError> {
        self.send(request).map_err(|_| SyncError::Disconnected)
    }
}

/// A change to one snapshot field, carrying the new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Occupants(Vec<ParticipantId>),
    Spectators(Vec<ParticipantId>),
    PlayerOne(Option<ParticipantId>),
    PlayerTwo(Option<ParticipantId>),
    BoardOne(BoardGrid),
    BoardTwo(BoardGrid),
    Running(bool),
    Turn { is_player_one_turn: bool },
    PendingDie(Option<u8>),
    Participants(Vec<ParticipantRecord>),
}

impl Change {
    /// Reads `field`'s current value out of `snapshot`.
    pub fn from_snapshot(field: SnapshotField, snapshot: &Snapshot) -> Self {
        match field {
            SnapshotField::Occupants => Self::Occupants(snapshot.occupant_ids.clone()),
            SnapshotField::Spectators => Self::Spectators(snapshot.spectator_ids.clone()),
            SnapshotField::PlayerOne => Self::PlayerOne(snapshot.player_one_id.clone()),
            SnapshotField::PlayerTwo => Self::PlayerTwo(snapshot.player_two_id.clone()),
            SnapshotField::BoardOne => Self::BoardOne(snapshot.board_one),
            SnapshotField::BoardTwo => Self::BoardTwo(snapshot.board_two),
            SnapshotField::Running => Self::Running(snapshot.running),
            SnapshotField::Turn => Self::Turn {
                is_player_one_turn: snapshot.is_player_one_turn,
            },
            SnapshotField::PendingDie => Self::PendingDie(snapshot.pending_die),
            SnapshotField::Participants => Self::Participants(snapshot.participants.clone()),
        }
    }

    /// Which snapshot field this change reports.
    pub fn field(&self) -> SnapshotField {
        match self {
            Self::Occupants(_) => SnapshotField::Occupants,
            Self::Spectators(_) => SnapshotField::Spectators,
            Self::PlayerOne(_) => SnapshotField::PlayerOne,
            Self::PlayerTwo(_) => SnapshotField::PlayerTwo,
            Self::BoardOne(_) => SnapshotField::BoardOne,
            Self::BoardTwo(_) => SnapshotField::BoardTwo,
            Self::Running(_) => SnapshotField::Running,
            Self::Turn { .. } => SnapshotField::Turn,
            Self::PendingDie(_) => SnapshotField::PendingDie,
            Self::Participants(_) => SnapshotField::Participants,
        }
    }
}

/// Receiving end of a [`SessionController::watch`] registration.
///
/// Dropping it unregisters the watcher on the controller's next update.
#[derive(Debug)]
pub struct ChangeStream {
    receiver: mpsc::UnboundedReceiver<Change>,
}

impl ChangeStream {
    /// Waits for the next change. `None` once the controller is dropped
    /// and everything buffered has been read.
    pub async fn next(&mut self) -> Option<Change> {
        self.receiver.recv().await
    }

    /// Returns a buffered change without waiting.
    pub fn try_next(&mut self) -> Option<Change> {
        self.receiver.try_recv().ok()
    }
}

struct Watcher {
    /// Empty means every field.
    fields: Vec<SnapshotField>,
    sender: mpsc::UnboundedSender<Change>,
}

impl Watcher {
    fn wants(&self, field: SnapshotField) -> bool {
        self.fields.is_empty() || self.fields.contains(&field)
    }
}

/// One participant's view of a session.
pub struct SessionController<S> {
    participant: ParticipantId,
    snapshot: Snapshot,
    last_seq: u64,
    sink: S,
    watchers: Vec<Watcher>,
}

impl<S: RequestSink> SessionController<S> {
    /// Builds a mirror seeded with `initial`, acting as `participant`.
    pub fn new(participant: ParticipantId, initial: Snapshot, sink: S) -> Self {
        Self {
            participant,
            snapshot: initial,
            last_seq: 0,
            sink,
            watchers: Vec::new(),
        }
    }

    /// Replaces the cached snapshot with the update's and returns what
    /// differs from the previous cache.
    ///
    /// The diff is computed locally, so missed or reordered updates still
    /// leave the mirror equal to the most recent snapshot it was given.
    ///
    /// # Errors
    /// [`SyncError::SessionMismatch`] if the update belongs to another
    /// session, [`SyncError::Protocol`] if the snapshot fails validation.
    /// The cache is untouched on error.
    pub fn apply(&mut self, update: Update) -> Result<Vec<Change>, SyncError> {
        if update.snapshot.session_id != self.snapshot.session_id {
            return Err(SyncError::SessionMismatch {
                expected: self.snapshot.session_id.clone(),
                got: update.snapshot.session_id,
            });
        }
        update.snapshot.validate()?;

        let changes: Vec<Change> = self
            .snapshot
            .diff(&update.snapshot)
            .into_iter()
            .map(|field| Change::from_snapshot(field, &update.snapshot))
            .collect();
        self.snapshot = update.snapshot;
        self.last_seq = update.seq;

        self.watchers.retain(|watcher| {
            changes
                .iter()
                .filter(|change| watcher.wants(change.field()))
                .all(|change| watcher.sender.send(change.clone()).is_ok())
                && !watcher.sender.is_closed()
        });

        if !changes.is_empty() {
            tracing::trace!(
                session_id = %self.snapshot.session_id,
                seq = self.last_seq,
                changed = changes.len(),
                "mirror updated"
            );
        }
        Ok(changes)
    }

    /// Decodes an [`Update`] with `codec` and applies it.
    pub fn receive_encoded<C: Codec>(
        &mut self,
        codec: &C,
        bytes: &[u8],
    ) -> Result<Vec<Change>, SyncError> {
        let update: Update = codec.decode(bytes)?;
        self.apply(update)
    }

    /// Registers interest in `fields`. An empty slice watches everything.
    pub fn watch(&mut self, fields: &[SnapshotField]) -> ChangeStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.watchers.push(Watcher {
            fields: fields.to_vec(),
            sender,
        });
        ChangeStream { receiver }
    }

    /// Watches every field.
    pub fn watch_all(&mut self) -> ChangeStream {
        self.watch(&[])
    }

    // -- Requests ----------------------------------------------------------

    /// Asks the session to start the game.
    pub async fn request_start(&self) -> Result<(), SyncError> {
        self.sink.submit(Request::Start).await
    }

    /// Asks to roll the die for this turn.
    pub async fn request_roll(&self) -> Result<(), SyncError> {
        self.sink.submit(Request::Roll).await
    }

    /// Asks to place the pending die in `row` of this participant's board.
    pub async fn request_place(&self, row: usize) -> Result<(), SyncError> {
        self.sink.submit(Request::Place { row }).await
    }

    // -- Accessors ---------------------------------------------------------

    /// The participant this mirror acts for.
    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    /// The session this mirror follows.
    pub fn session_id(&self) -> &SessionId {
        &self.snapshot.session_id
    }

    /// The cached snapshot, as of the last applied update.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Sequence number of the last update applied, 0 before any.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Everyone in the zone, in arrival order.
    pub fn occupants(&self) -> &[ParticipantId] {
        &self.snapshot.occupant_ids
    }

    /// Participants watching without a seat.
    pub fn spectators(&self) -> &[ParticipantId] {
        &self.snapshot.spectator_ids
    }

    /// Player one, if the seat is taken.
    pub fn player_one(&self) -> Option<&ParticipantId> {
        self.snapshot.player_one_id.as_ref()
    }

    /// Player two, if the seat is taken.
    pub fn player_two(&self) -> Option<&ParticipantId> {
        self.snapshot.player_two_id.as_ref()
    }

    /// Player one's board as rows of faces, 0 for empty.
    pub fn board_one(&self) -> &BoardGrid {
        &self.snapshot.board_one
    }

    /// Player two's board, same layout as [`Self::board_one`].
    pub fn board_two(&self) -> &BoardGrid {
        &self.snapshot.board_two
    }

    /// Whether a game is in progress.
    pub fn is_running(&self) -> bool {
        self.snapshot.running
    }

    /// `true` when player one acts next.
    pub fn is_player_one_turn(&self) -> bool {
        self.snapshot.is_player_one_turn
    }

    /// The rolled value waiting to be placed.
    pub fn pending_die(&self) -> Option<u8> {
        self.snapshot.pending_die
    }

    /// The display record for `id`, if the snapshot carried one.
    pub fn record_of(&self, id: &ParticipantId) -> Option<&ParticipantRecord> {
        self.snapshot.participants.iter().find(|r| &r.id == id)
    }

    /// This participant's role according to the cached snapshot.
    pub fn my_role(&self) -> Option<Role> {
        let me = Some(&self.participant);
        if self.player_one() == me {
            Some(Role::Player(Seat::One))
        } else if self.player_two() == me {
            Some(Role::Player(Seat::Two))
        } else if self.snapshot.spectator_ids.contains(&self.participant) {
            Some(Role::Spectator)
        } else {
            None
        }
    }

    /// `true` while the game is running and the turn is this participant's.
    pub fn is_my_turn(&self) -> bool {
        let turn = if self.is_player_one_turn() {
            Seat::One
        } else {
            Seat::Two
        };
        self.is_running() && self.my_role() == Some(Role::Player(turn))
    }
}
