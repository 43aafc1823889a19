use deckhand_core::protocol::{Choice, Message, Strategy, StrategyError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Picks uniformly among the offered options.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: SmallRng,
}

impl RandomStrategy {
    pub fn new(rng: SmallRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<V, O> Strategy<V, O> for RandomStrategy {
    fn decide(
        &mut self,
        choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        Ok(self.rng.gen_range(0..choice.len()))
    }
}
