#![allow(dead_code)]

use std::sync::Arc;

use deckhand_core::booster::{BoosterBox, BoosterCache};
use deckhand_core::cards::{CardLibrary, SetShape, SyntheticSource};
use deckhand_core::protocol::{Choice, Message, Player, Strategy, StrategyError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn neo_cache() -> BoosterCache {
    BoosterCache::new(CardLibrary::new(Box::new(SyntheticSource::new(vec![
        SetShape::neo_like("neo"),
    ]))))
}

pub fn neo_box(cache: &BoosterCache) -> BoosterBox {
    BoosterBox::new(Arc::clone(&cache.composition("neo").expect("composition")))
}

pub struct FirstOption;

impl<V, O> Strategy<V, O> for FirstOption {
    fn decide(
        &mut self,
        _choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        Ok(0)
    }
}

pub struct Uniform(pub SmallRng);

impl Uniform {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl<V, O> Strategy<V, O> for Uniform {
    fn decide(
        &mut self,
        choice: &Choice<O>,
        _history: &[Message<V, O>],
    ) -> Result<usize, StrategyError> {
        Ok(self.0.gen_range(0..choice.len()))
    }
}

pub fn first_option_players<V: 'static, O: 'static>(count: usize) -> Vec<Player<V, O>> {
    (0..count)
        .map(|i| Player::new(format!("first-{i}"), Box::new(FirstOption) as Box<dyn Strategy<V, O>>))
        .collect()
}

pub fn random_players<V: 'static, O: 'static>(count: usize, seed: u64) -> Vec<Player<V, O>> {
    (0..count)
        .map(|i| {
            Player::new(
                format!("random-{i}"),
                Box::new(Uniform::seeded(seed.wrapping_add(i as u64))) as Box<dyn Strategy<V, O>>,
            )
        })
        .collect()
}
