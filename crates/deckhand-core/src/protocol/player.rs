use thiserror::Error;

use crate::protocol::error::ProtocolError;
use crate::protocol::message::{Choice, Decision, Message};

/// Decision-making behaviour plugged into a [`Player`].
pub trait Strategy<V, O> {
    /// Called for every view after it has been appended to the history.
    fn observe(&mut self, _view: &V) {}

    /// Returns the index of the chosen option. `history` already ends with
    /// `choice`. Out-of-range answers are rejected by the player, not clamped.
    fn decide(
        &mut self,
        choice: &Choice<O>,
        history: &[Message<V, O>],
    ) -> Result<usize, StrategyError>;
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("input source failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("input closed before a valid answer was given")]
    InputClosed,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("strategy failed: {0}")]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A seated participant: an append-only message history plus a strategy.
pub struct Player<V, O> {
    name: String,
    strategy: Box<dyn Strategy<V, O>>,
    history: Vec<Message<V, O>>,
}

impl<V, O> Player<V, O> {
    pub fn new(name: impl Into<String>, strategy: Box<dyn Strategy<V, O>>) -> Self {
        Self {
            name: name.into(),
            strategy,
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn history(&self) -> &[Message<V, O>] {
        &self.history
    }

    pub fn decisions(&self) -> usize {
        self.history
            .iter()
            .filter(|message| matches!(message, Message::Decision(_)))
            .count()
    }

    pub fn view(&mut self, view: V) {
        self.history.push(Message::View(view));
        if let Some(Message::View(view)) = self.history.last() {
            self.strategy.observe(view);
        }
    }
}

impl<V, O: Clone> Player<V, O> {
    pub fn choice(&mut self, choice: &Choice<O>) -> Result<Decision<O>, PlayerError> {
        self.history.push(Message::Choice(choice.clone()));
        let index = self.strategy.decide(choice, &self.history)?;
        let decision = choice.decision(index)?;
        self.history.push(Message::Decision(decision.clone()));
        Ok(decision)
    }
}

impl<V, O> std::fmt::Debug for Player<V, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("history_len", &self.history.len())
            .finish()
    }
}
