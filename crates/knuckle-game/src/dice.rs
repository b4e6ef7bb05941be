//! Die faces and the rollers that produce them.
//!
//! Sessions roll through the [`DieRoller`] trait so tests and demos can
//! swap the random source for a fixed sequence.

use std::fmt;

use rand::Rng;

/// A single die face, always in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieFace(u8);

impl DieFace {
    /// Every face, lowest first.
    pub const ALL: [DieFace; 6] = [
        DieFace(1),
        DieFace(2),
        DieFace(3),
        DieFace(4),
        DieFace(5),
        DieFace(6),
    ];

    /// Returns the face showing `value`, or `None` outside `1..=6`.
    pub fn new(value: u8) -> Option<Self> {
        (1..=6).contains(&value).then_some(Self(value))
    }

    /// The number of pips.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source of die rolls.
pub trait DieRoller: Send + fmt::Debug + 'static {
    fn roll(&mut self) -> DieFace;
}

/// Rolls a fair six-sided die using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoller;

impl DieRoller for RandomRoller {
    fn roll(&mut self) -> DieFace {
        let index = rand::rng().random_range(0..DieFace::ALL.len());
        DieFace::ALL[index]
    }
}

/// Replays a fixed list of faces, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct SequenceRoller {
    faces: Vec<DieFace>,
    next: usize,
}

impl SequenceRoller {
    /// Creates a roller that yields `faces` in order, forever.
    ///
    /// An empty list behaves like `[1]`.
    pub fn new(faces: impl IntoIterator<Item = DieFace>) -> Self {
        let mut faces: Vec<DieFace> = faces.into_iter().collect();
        if faces.is_empty() {
            faces.push(DieFace::ALL[0]);
        }
        Self { faces, next: 0 }
    }

    /// Builds a roller from raw pip values, skipping anything outside
    /// `1..=6`.
    pub fn from_values(values: &[u8]) -> Self {
        Self::new(values.iter().copied().filter_map(DieFace::new))
    }
}

impl DieRoller for SequenceRoller {
    fn roll(&mut self) -> DieFace {
        let face = self.faces[self.next];
        self.next = (self.next + 1) % self.faces.len();
        face
    }
}
