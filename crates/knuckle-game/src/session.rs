//! The authoritative session: one Knucklebones game and everyone in its zone.
//!
//! All rule enforcement lives here. Every mutating method checks legality
//! first and does nothing at all when the action is illegal, reporting that
//! through its return value rather than an error. Callers decide whether to
//! emit a snapshot from that return value.

use std::fmt;

use knuckle_protocol::{ParticipantId, SessionId, Snapshot};

use crate::{
    Board, DieFace, DieRoller, JoinOutcome, Placement, RandomRoller, Role,
    Roster, Seat, Zone,
};

/// The lifecycle phase of a session.
///
/// ```text
///   Idle ──(second player joins)──→ Ready ──(start)──→ Running
///    ↑                                                    │
///    └───────────────(any player leaves, reset)───────────┘
/// ```
///
/// A player leaving a `Ready` session drops it back to `Idle` without a
/// reset, since nothing has been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than two players.
    Idle,
    /// Two players, not started.
    Ready,
    /// Two players, turns in progress.
    Running,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Ready => write!(f, "Ready"),
            Self::Running => write!(f, "Running"),
        }
    }
}

/// What happened when a participant left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The role they vacated.
    pub role: Role,
    /// `true` if their departure ended a running game.
    pub reset: bool,
}

/// One game session.
pub struct Session {
    zone: Zone,
    roster: Roster,
    /// Indexed by seat: `[player one, player two]`.
    boards: [Board; 2],
    running: bool,
    turn: Seat,
    pending_die: Option<DieFace>,
    roller: Box<dyn DieRoller>,
}

impl Session {
    /// Creates an idle session for `zone`, rolling with [`RandomRoller`].
    pub fn new(zone: Zone) -> Self {
        Self::with_roller(zone, Box::new(RandomRoller))
    }

    /// Creates an idle session that draws its rolls from `roller`.
    pub fn with_roller(zone: Zone, roller: Box<dyn DieRoller>) -> Self {
        Self {
            zone,
            roster: Roster::new(),
            boards: [Board::new(), Board::new()],
            running: false,
            turn: Seat::One,
            pending_die: None,
            roller,
        }
    }

    // -- Membership --------------------------------------------------------

    /// Admits `participant` to the zone and gives them a role.
    ///
    /// Returns [`JoinOutcome::AlreadyJoined`] without changing anything if
    /// they already hold a role.
    pub fn join(&mut self, participant: ParticipantId) -> JoinOutcome {
        let outcome = self.roster.join(participant.clone());
        if let JoinOutcome::Joined(role) = outcome {
            self.zone.add(participant.clone());
            tracing::info!(
                session_id = %self.zone.id(),
                %participant,
                %role,
                "participant joined"
            );
        }
        outcome
    }

    /// Removes `participant` from the zone and their role.
    ///
    /// If a player leaves a running game the session resets: boards are
    /// cleared, the pending die is dropped, and the turn returns to player
    /// one. Returns `None` if they were not present.
    pub fn leave(&mut self, participant: &ParticipantId) -> Option<Departure> {
        let role = self.roster.leave(participant)?;
        self.zone.remove(participant);

        let reset = self.running && matches!(role, Role::Player(_));
        if reset {
            self.reset();
        }
        tracing::info!(
            session_id = %self.zone.id(),
            %participant,
            %role,
            reset,
            "participant left"
        );
        Some(Departure { role, reset })
    }

    // -- Game actions ------------------------------------------------------

    /// Starts the game. Legal only with both seats filled and the game not
    /// already running. Returns `false` (and changes nothing) otherwise.
    pub fn start(&mut self) -> bool {
        if self.phase() != Phase::Ready {
            tracing::debug!(
                session_id = %self.zone.id(),
                phase = %self.phase(),
                "start rejected"
            );
            return false;
        }
        self.running = true;
        self.turn = Seat::One;
        tracing::info!(session_id = %self.zone.id(), "game started");
        true
    }

    /// Rolls the die for the player whose turn it is.
    ///
    /// Rejected (returning `None`) unless the game is running, `participant`
    /// holds the seat whose turn it is, and no die is already pending.
    pub fn roll_die(&mut self, participant: &ParticipantId) -> Option<DieFace> {
        if !self.is_turn_of(participant) || self.pending_die.is_some() {
            tracing::debug!(
                session_id = %self.zone.id(),
                %participant,
                "roll rejected"
            );
            return None;
        }
        let face = self.roller.roll();
        self.pending_die = Some(face);
        tracing::info!(
            session_id = %self.zone.id(),
            %participant,
            %face,
            "die rolled"
        );
        Some(face)
    }

    /// Places the pending die on the acting player's own board, capturing
    /// matching dice from the opponent's same row.
    ///
    /// Rejected (returning `None`) unless the game is running, it is
    /// `participant`'s turn, and a die is pending. A full or nonexistent
    /// row is also rejected; the pending die is kept so the player can
    /// pick another row. On success the pending die clears and the turn
    /// passes to the other seat.
    pub fn place_die(
        &mut self,
        participant: &ParticipantId,
        row: usize,
    ) -> Option<Placement> {
        if !self.is_turn_of(participant) {
            tracing::debug!(
                session_id = %self.zone.id(),
                %participant,
                "place rejected: not their turn"
            );
            return None;
        }
        let face = self.pending_die?;
        if !self.board(self.turn).row_has_space(row) {
            tracing::debug!(
                session_id = %self.zone.id(),
                %participant,
                row,
                "place rejected: row full or out of range"
            );
            return None;
        }

        let (own, opponent) = self.boards_for(self.turn);
        match own.place_capturing(opponent, row, face) {
            Ok(placement) => {
                self.pending_die = None;
                self.turn = self.turn.other();
                tracing::info!(
                    session_id = %self.zone.id(),
                    %participant,
                    row,
                    column = placement.column,
                    %face,
                    captured = placement.captured,
                    "die placed"
                );
                Some(placement)
            }
            Err(reason) => {
                tracing::debug!(
                    session_id = %self.zone.id(),
                    %participant,
                    %reason,
                    "place rejected"
                );
                None
            }
        }
    }

    // -- Projection --------------------------------------------------------

    /// Projects the session to its wire shape. Pure; `participants` is left
    /// empty for the synchronization layer to fill in.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.zone.id().clone(),
            occupant_ids: self.zone.occupants().to_vec(),
            spectator_ids: self.roster.spectators().to_vec(),
            player_one_id: self.roster.player(Seat::One).cloned(),
            player_two_id: self.roster.player(Seat::Two).cloned(),
            board_one: self.boards[0].to_grid(),
            board_two: self.boards[1].to_grid(),
            running: self.running,
            is_player_one_turn: self.turn == Seat::One,
            pending_die: self.pending_die.map(DieFace::value),
            participants: Vec::new(),
        }
    }

    // -- Accessors ---------------------------------------------------------

    /// The session id, which is its zone's name.
    pub fn id(&self) -> &SessionId {
        self.zone.id()
    }

    /// The zone this session covers.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Who holds which role.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Lifecycle phase, derived from the running flag and the roster.
    pub fn phase(&self) -> Phase {
        match (self.running, self.roster.is_full()) {
            (true, _) => Phase::Running,
            (false, true) => Phase::Ready,
            (false, false) => Phase::Idle,
        }
    }

    /// `true` between a successful start and the next reset.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whose turn it is. Meaningful only while running.
    pub fn turn(&self) -> Seat {
        self.turn
    }

    /// The rolled die awaiting placement.
    pub fn pending_die(&self) -> Option<DieFace> {
        self.pending_die
    }

    /// The board belonging to `seat`.
    pub fn board(&self, seat: Seat) -> &Board {
        match seat {
            Seat::One => &self.boards[0],
            Seat::Two => &self.boards[1],
        }
    }

    /// `participant`'s role, if they are in the session.
    pub fn role_of(&self, participant: &ParticipantId) -> Option<Role> {
        self.roster.role_of(participant)
    }

    // -- Internals ---------------------------------------------------------

    fn is_turn_of(&self, participant: &ParticipantId) -> bool {
        self.running && self.roster.player(self.turn) == Some(participant)
    }

    /// Splits the boards into `(seat's own, opponent's)`.
    fn boards_for(&mut self, seat: Seat) -> (&mut Board, &mut Board) {
        let [one, two] = &mut self.boards;
        match seat {
            Seat::One => (one, two),
            Seat::Two => (two, one),
        }
    }

    fn reset(&mut self) {
        self.running = false;
        self.boards.iter_mut().for_each(Board::clear);
        self.pending_die = None;
        self.turn = Seat::One;
        tracing::info!(session_id = %self.zone.id(), "game reset");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", self.zone.id())
            .field("phase", &self.phase())
            .field("turn", &self.turn)
            .field("pending_die", &self.pending_die)
            .field("roller", &self.roller)
            .finish_non_exhaustive()
    }
}
