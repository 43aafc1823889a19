//! Turn-based decision protocol: the message model exchanged between a
//! process and its players, the suspend/resume contract processes implement,
//! and the engine that routes messages between them.

pub mod engine;
pub mod error;
pub mod message;
pub mod player;
pub mod process;

pub use engine::{Engine, EngineError, RunSummary};
pub use error::{DecisionFault, ProcessError, ProtocolError};
pub use message::{Choice, ChoiceId, Decision, Message, MessageBundle, Views};
pub use player::{Player, PlayerError, Strategy, StrategyError};
pub use process::{Process, Reply, Sequence, Step};
