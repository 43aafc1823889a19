//! Suspend/resume contract between a process and the engine.
//!
//! A process is an explicit state machine: every point where it waits for the
//! engine is a variant of its own stage enum, and each call to `resume`
//! advances it to the next suspension point. Nested sub-sequences implement
//! [`Sequence`] and are driven from their parent with [`yield_from!`].

use crate::protocol::error::{ProcessError, ProtocolError};
use crate::protocol::message::{Choice, MessageBundle};

/// Payload the engine resumes a process with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// First resume, or the previous bundle carried no choice.
    Advance,
    /// Index chosen for the previous bundle's choice, already validated.
    Picked(usize),
}

impl Reply {
    pub fn picked(self) -> Option<usize> {
        match self {
            Reply::Picked(index) => Some(index),
            Reply::Advance => None,
        }
    }

    /// Checks the reply matches a bundle that carried no choice.
    pub fn advance(self) -> Result<(), ProtocolError> {
        match self {
            Reply::Advance => Ok(()),
            found => Err(ProtocolError::UnexpectedReply {
                expected: "an advance",
                found,
            }),
        }
    }

    /// Checks the reply answers `choice` and returns the picked index.
    pub fn pick<O>(self, choice: &Choice<O>) -> Result<usize, ProtocolError> {
        match self {
            Reply::Picked(index) if choice.is_valid_index(index) => Ok(index),
            found => Err(ProtocolError::UnexpectedReply {
                expected: "a pick for the pending choice",
                found,
            }),
        }
    }
}

/// Outcome of resuming a sub-sequence.
#[derive(Debug)]
pub enum Step<B, T = ()> {
    Yield(B),
    Done(T),
}

/// A top-level coroutine driven by the engine.
pub trait Process {
    type View;
    type Opt;

    fn num_players(&self) -> usize;

    /// Advances to the next suspension point. `Ok(None)` is structural
    /// termination: the process has nothing more to say.
    fn resume(
        &mut self,
        reply: Reply,
    ) -> Result<Option<MessageBundle<Self::View, Self::Opt>>, ProcessError>;
}

/// A nested coroutine operating on its parent's state `S`.
pub trait Sequence<S> {
    type View;
    type Opt;
    type Output;

    fn resume(
        &mut self,
        state: &mut S,
        reply: Reply,
    ) -> Result<Step<MessageBundle<Self::View, Self::Opt>, Self::Output>, ProcessError>;
}

/// Delegates to a sub-sequence step: forwards its yield out of the enclosing
/// function, or evaluates to its output once it completes.
#[macro_export]
macro_rules! yield_from {
    ($step:expr) => {
        match $step? {
            $crate::protocol::Step::Yield(bundle) => {
                return Ok($crate::protocol::Step::Yield(bundle));
            }
            $crate::protocol::Step::Done(output) => output,
        }
    };
}
