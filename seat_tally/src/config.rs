// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A ranked ballot: candidate names, most preferred first.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub choices: Vec<String>,
}

impl Ballot {
    pub fn new(choices: &[String]) -> Ballot {
        Ballot {
            choices: choices.to_vec(),
        }
    }
}

// ******** Output data structures *********

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Counts for the candidates still active at the start of the round, in candidate order.
    pub tally: Vec<(String, u64)>,
    pub elected: String,
    pub eliminated: String,
    /// Ballots that did not count for anyone in this round.
    pub exhausted: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    pub seats: u32,
    /// Elected candidates, in the order they were elected.
    pub winners: Vec<String>,
    /// Eliminated candidates, in the order they were eliminated.
    pub eliminated: Vec<String>,
    pub round_stats: Vec<RoundStats>,
}

/// The reasons a ballot can be refused.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InvalidBallot {
    WrongLength { expected: usize, found: usize },
    UnknownCandidate(String),
    DuplicateCandidate(String),
}

impl InvalidBallot {
    /// The short tag of the failure, as reported to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            InvalidBallot::WrongLength { .. } => "WrongLength",
            InvalidBallot::UnknownCandidate(_) => "UnknownCandidate",
            InvalidBallot::DuplicateCandidate(_) => "DuplicateCandidate",
        }
    }
}

impl Error for InvalidBallot {}

impl Display for InvalidBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidBallot::WrongLength { expected, found } => write!(
                f,
                "ballot must rank exactly {} candidates, found {}",
                expected, found
            ),
            InvalidBallot::UnknownCandidate(name) => write!(f, "unknown candidate {:?}", name),
            InvalidBallot::DuplicateCandidate(name) => {
                write!(f, "candidate {:?} is ranked more than once", name)
            }
        }
    }
}

/// Errors that prevent an election from being assembled.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    EmptyElection,
    InvalidBallot(InvalidBallot),
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::EmptyElection => write!(f, "TallyError: no candidates registered"),
            TallyErrors::InvalidBallot(ib) => write!(f, "TallyError: {}", ib),
        }
    }
}

impl From<InvalidBallot> for TallyErrors {
    fn from(ib: InvalidBallot) -> Self {
        TallyErrors::InvalidBallot(ib)
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRules {
    /// Number of seats to fill.
    pub seats: u32,
    /// Exact number of ranks every ballot must fill.
    pub ranks_required: usize,
}

impl TallyRules {
    pub const DEFAULT_RULES: TallyRules = TallyRules {
        seats: 14,
        ranks_required: 14,
    };
}
