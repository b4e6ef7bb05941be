//! Seat assignment: who is player one, who is player two, who watches.

use std::fmt;

use knuckle_protocol::ParticipantId;

/// One of the two player seats. Also used as the turn flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

/// The role a participant holds in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player(Seat),
    Spectator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(Seat::One) => write!(f, "player-one"),
            Self::Player(Seat::Two) => write!(f, "player-two"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

/// Result of [`Roster::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The participant was given this role.
    Joined(Role),
    /// The participant already held this role; nothing changed.
    AlreadyJoined(Role),
}

impl JoinOutcome {
    /// The role the participant holds after the call.
    pub fn role(self) -> Role {
        match self {
            Self::Joined(role) | Self::AlreadyJoined(role) => role,
        }
    }
}

/// Two player seats filled in arrival order, plus everyone else watching.
///
/// A participant id appears in at most one role. A vacated seat stays
/// vacant until the next arrival; spectators are never promoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    seats: [Option<ParticipantId>; 2],
    spectators: Vec<ParticipantId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `participant` the first free seat, or a spectator place if
    /// both seats are taken.
    pub fn join(&mut self, participant: ParticipantId) -> JoinOutcome {
        if let Some(role) = self.role_of(&participant) {
            return JoinOutcome::AlreadyJoined(role);
        }
        for seat in [Seat::One, Seat::Two] {
            let slot = &mut self.seats[seat.index()];
            if slot.is_none() {
                *slot = Some(participant);
                return JoinOutcome::Joined(Role::Player(seat));
            }
        }
        self.spectators.push(participant);
        JoinOutcome::Joined(Role::Spectator)
    }

    /// Clears whatever role `participant` held and returns it. Leaving
    /// twice is a no-op that returns `None`.
    pub fn leave(&mut self, participant: &ParticipantId) -> Option<Role> {
        for seat in [Seat::One, Seat::Two] {
            let slot = &mut self.seats[seat.index()];
            if slot.as_ref() == Some(participant) {
                *slot = None;
                return Some(Role::Player(seat));
            }
        }
        let position = self.spectators.iter().position(|s| s == participant)?;
        self.spectators.remove(position);
        Some(Role::Spectator)
    }

    /// `true` exactly when both seats are occupied.
    pub fn is_full(&self) -> bool {
        self.seats.iter().all(Option::is_some)
    }

    pub fn role_of(&self, participant: &ParticipantId) -> Option<Role> {
        for seat in [Seat::One, Seat::Two] {
            if self.seats[seat.index()].as_ref() == Some(participant) {
                return Some(Role::Player(seat));
            }
        }
        self.spectators
            .contains(participant)
            .then_some(Role::Spectator)
    }

    /// The participant in `seat`, if any.
    pub fn player(&self, seat: Seat) -> Option<&ParticipantId> {
        self.seats[seat.index()].as_ref()
    }

    /// Spectators in arrival order.
    pub fn spectators(&self) -> &[ParticipantId] {
        &self.spectators
    }
}
