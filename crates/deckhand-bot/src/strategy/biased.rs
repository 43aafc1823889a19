use deckhand_core::protocol::{Choice, Message, Strategy, StrategyError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_FIRST_BIAS: f64 = 0.5;

/// Picks option 0 with probability `first_bias`, otherwise uniformly among
/// the remaining options.
#[derive(Debug, Clone)]
pub struct BiasedStrategy {
    rng: SmallRng,
    first_bias: f64,
}

impl BiasedStrategy {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            rng,
            first_bias: DEFAULT_FIRST_BIAS,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// Clamped into `0.0..=1.0`; NaN falls back to the default.
    pub fn with_first_bias(mut self, first_bias: f64) -> Self {
        self.first_bias = if first_bias.is_nan() {
            DEFAULT_FIRST_BIAS
        } else {
            first_bias.clamp(0.0, 1.0)
        };
        self
    }

    pub fn first_bias(&self) -> f64 {
        self.first_bias
    }
}

impl<V, O> Strategy<V, O> for BiasedStrategy {
    fn decide(
        &mut self,
        choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        if choice.len() == 1 || self.rng.gen_bool(self.first_bias) {
            return Ok(0);
        }
        Ok(self.rng.gen_range(1..choice.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picks(strategy: &mut BiasedStrategy, options: usize, rounds: usize) -> Vec<usize> {
        let choice = Choice::new(0, "pick", (0..options).collect::<Vec<_>>()).expect("choice");
        (0..rounds)
            .map(|_| Strategy::<(), usize>::decide(strategy, &choice, &[]).expect("decide"))
            .collect()
    }

    #[test]
    fn single_option_is_always_taken() {
        let mut strategy = BiasedStrategy::seeded(1).with_first_bias(0.0);
        assert!(picks(&mut strategy, 1, 20).iter().all(|&index| index == 0));
    }

    #[test]
    fn full_bias_always_takes_first() {
        let mut strategy = BiasedStrategy::seeded(2).with_first_bias(1.0);
        assert!(picks(&mut strategy, 6, 50).iter().all(|&index| index == 0));
    }

    #[test]
    fn zero_bias_never_takes_first() {
        let mut strategy = BiasedStrategy::seeded(3).with_first_bias(0.0);
        let answers = picks(&mut strategy, 4, 200);
        assert!(answers.iter().all(|&index| (1..4).contains(&index)));
    }

    #[test]
    fn default_bias_takes_first_about_half_the_time() {
        let mut strategy = BiasedStrategy::seeded(4);
        let answers = picks(&mut strategy, 3, 2_000);
        let first = answers.iter().filter(|&&index| index == 0).count();
        assert!((800..1_200).contains(&first), "first picked {first} times");
    }

    #[test]
    fn bias_is_clamped() {
        assert_eq!(BiasedStrategy::seeded(0).with_first_bias(3.0).first_bias(), 1.0);
        assert_eq!(
            BiasedStrategy::seeded(0).with_first_bias(f64::NAN).first_bias(),
            DEFAULT_FIRST_BIAS
        );
    }
}
