use deckhand_core::protocol::{Choice, Message, Strategy, StrategyError};

/// Always answers with the same option index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedStrategy {
    index: usize,
}

impl FixedStrategy {
    pub const fn first() -> Self {
        Self { index: 0 }
    }

    /// An index past the end of a choice is passed through and rejected by
    /// the player.
    pub const fn at(index: usize) -> Self {
        Self { index }
    }

    pub const fn index(self) -> usize {
        self.index
    }
}

impl<V, O> Strategy<V, O> for FixedStrategy {
    fn decide(
        &mut self,
        _choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        Ok(self.index)
    }
}
