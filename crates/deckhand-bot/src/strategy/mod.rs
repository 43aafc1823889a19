mod biased;
mod fixed;
mod random;

pub use biased::{BiasedStrategy, DEFAULT_FIRST_BIAS};
pub use fixed::FixedStrategy;
pub use random::RandomStrategy;

use deckhand_core::protocol::Strategy;

/// Non-interactive strategy variants that can be built from a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Fixed,
    Random,
    Biased,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Fixed,
        StrategyKind::Random,
        StrategyKind::Biased,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Fixed => "fixed",
            StrategyKind::Random => "random",
            StrategyKind::Biased => "biased",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" | "first" => Some(StrategyKind::Fixed),
            "random" | "uniform" => Some(StrategyKind::Random),
            "biased" => Some(StrategyKind::Biased),
            _ => None,
        }
    }

    /// Boxes a strategy of this kind. `seed` is ignored by the fixed variant.
    pub fn boxed<V, O>(self, seed: u64) -> Box<dyn Strategy<V, O>> {
        match self {
            StrategyKind::Fixed => Box::new(FixedStrategy::first()),
            StrategyKind::Random => Box::new(RandomStrategy::seeded(seed)),
            StrategyKind::Biased => Box::new(BiasedStrategy::seeded(seed)),
        }
    }
}
