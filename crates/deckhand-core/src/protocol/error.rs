use thiserror::Error;

use crate::booster::SamplingError;
use crate::protocol::process::Reply;

/// Why a decision was rejected by the choice it claims to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecisionFault {
    #[error("index out of range for {options} options")]
    OutOfRange { options: usize },
    #[error("decision answers a different choice")]
    ForeignChoice,
    #[error("option does not match the one offered at that index")]
    OptionMismatch,
}

/// Violations of the message protocol itself. All of them are fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("choice '{description}' for player {player} has no options")]
    InvalidChoice { player: usize, description: String },
    #[error("invalid decision at index {index}: {fault}")]
    InvalidDecision { index: usize, fault: DecisionFault },
    #[error("views carry {found} entries but {expected} players are seated")]
    MalformedBundle { expected: usize, found: usize },
    #[error("choice addressed to player {player} but only {players} are seated")]
    InvalidPlayer { player: usize, players: usize },
    #[error("process expected {expected} but was resumed with {found:?}")]
    UnexpectedReply { expected: &'static str, found: Reply },
}

/// Failures raised while a process advances.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error("{process} supports {min}..={max} players but {found} were requested")]
    SeatCount {
        process: &'static str,
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("deck building did not finish within {limit} choices")]
    BuildTimeout { limit: usize },
    #[error("rules violation: {0}")]
    Rules(String),
}

impl ProcessError {
    pub(crate) fn rules(message: impl Into<String>) -> Self {
        ProcessError::Rules(message.into())
    }
}
