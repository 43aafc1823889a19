use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Add;

use rand::Rng;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("{cards} cards were supplied with {weights} weights")]
    LengthMismatch { cards: usize, weights: usize },
    #[error("weight {weight} is negative or not finite")]
    InvalidWeight { weight: f64 },
    #[error("slot table has no drawable weight")]
    EmptyTable,
    #[error("booster for '{set}' defines {found} slots, expected {expected}")]
    SlotCount {
        set: String,
        expected: usize,
        found: usize,
    },
    #[error("slot '{slot}' of set '{set}' has no drawable cards")]
    EmptySlot { set: String, slot: &'static str },
}

/// Unnormalized weights for one booster slot. Entries keep first-seen order,
/// which keeps the normalized table, and therefore every draw, reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWeights<T> {
    entries: Vec<(T, f64)>,
}

impl<T> Default for SlotWeights<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> SlotWeights<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards_and_weights(cards: Vec<T>, weights: &[f64]) -> Result<Self, SamplingError> {
        if cards.len() != weights.len() {
            return Err(SamplingError::LengthMismatch {
                cards: cards.len(),
                weights: weights.len(),
            });
        }

        let mut slot = Self::new();
        for (card, weight) in cards.into_iter().zip(weights.iter().copied()) {
            slot.add_weight(card, weight)?;
        }
        Ok(slot)
    }

    /// Spreads `total` evenly over `cards`.
    pub fn spread(cards: Vec<T>, total: f64) -> Result<Self, SamplingError> {
        let count = cards.len();
        if count == 0 {
            return Ok(Self::new());
        }
        let weights = vec![total / count as f64; count];
        Self::from_cards_and_weights(cards, &weights)
    }

    pub fn uniform(cards: Vec<T>) -> Self {
        let mut slot = Self::new();
        for card in cards {
            slot.accumulate(card, 1.0);
        }
        slot
    }

    /// Adds `weight` to `card`, summing with any weight it already has.
    pub fn add_weight(&mut self, card: T, weight: f64) -> Result<(), SamplingError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SamplingError::InvalidWeight { weight });
        }
        self.accumulate(card, weight);
        Ok(())
    }

    fn accumulate(&mut self, card: T, weight: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == card) {
            entry.1 += weight;
        } else {
            self.entries.push((card, weight));
        }
    }

    /// Additive union: cards present in both keep the sum of their weights.
    pub fn combine(&self, other: &SlotWeights<T>) -> SlotWeights<T> {
        let mut positions: HashMap<&T, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, (card, _))| (card, index))
            .collect();
        let mut entries = self.entries.clone();
        for (card, weight) in &other.entries {
            match positions.get(card) {
                Some(&index) => entries[index].1 += *weight,
                None => {
                    positions.insert(card, entries.len());
                    entries.push((card.clone(), *weight));
                }
            }
        }
        SlotWeights { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    pub fn weight_of(&self, card: &T) -> f64 {
        self.entries
            .iter()
            .find(|(existing, _)| existing == card)
            .map_or(0.0, |(_, weight)| *weight)
    }

    /// Rescales weights to sum to 1 and builds the drawable table.
    pub fn normalize(&self) -> Result<SlotTable<T>, SamplingError> {
        let total = self.total();
        if self.entries.is_empty() || total <= 0.0 {
            return Err(SamplingError::EmptyTable);
        }

        let entries: Vec<(T, f64)> = self
            .entries
            .iter()
            .map(|(card, weight)| (card.clone(), weight / total))
            .collect();
        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight)).map_err(
            |err| match err {
                WeightedError::InvalidWeight => SamplingError::InvalidWeight { weight: total },
                _ => SamplingError::EmptyTable,
            },
        )?;

        Ok(SlotTable { entries, index })
    }
}

impl<T: Clone + Eq + Hash> Add for SlotWeights<T> {
    type Output = SlotWeights<T>;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(&rhs)
    }
}

/// Normalized, immutable weights for one slot, ready to draw from.
#[derive(Debug, Clone)]
pub struct SlotTable<T> {
    entries: Vec<(T, f64)>,
    index: WeightedIndex<f64>,
}

impl<T> SlotTable<T> {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.entries[self.index.sample(rng)].0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.entries.iter().map(|(card, weight)| (card, *weight))
    }

    pub fn probability_of(&self, card: &T) -> f64
    where
        T: PartialEq,
    {
        self.entries
            .iter()
            .find(|(existing, _)| existing == card)
            .map_or(0.0, |(_, weight)| *weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn length_mismatch_is_rejected() {
        let err = SlotWeights::from_cards_and_weights(vec!['a', 'b'], &[1.0]).expect_err("mismatch");
        assert_eq!(err, SamplingError::LengthMismatch { cards: 2, weights: 1 });
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = SlotWeights::from_cards_and_weights(vec!['a'], &[-0.5]).expect_err("negative");
        assert!(matches!(err, SamplingError::InvalidWeight { .. }));
    }

    #[test]
    fn duplicate_cards_in_one_call_are_summed() {
        let slot = SlotWeights::from_cards_and_weights(vec!['a', 'b', 'a'], &[1.0, 2.0, 0.5])
            .expect("slot");
        assert_eq!(slot.len(), 2);
        assert_eq!(slot.weight_of(&'a'), 1.5);
        assert_eq!(slot.total(), 3.5);
    }

    #[test]
    fn add_weight_accumulates_and_rejects_bad_weights() {
        let mut slot = SlotWeights::new();
        slot.add_weight("plains", 2.0).expect("first");
        slot.add_weight("island", 1.0).expect("second");
        slot.add_weight("plains", 0.25).expect("again");
        assert_eq!(slot.weight_of(&"plains"), 2.25);
        assert_eq!(slot.len(), 2);

        assert!(matches!(
            slot.add_weight("swamp", f64::NAN),
            Err(SamplingError::InvalidWeight { .. })
        ));
        assert!(matches!(
            slot.add_weight("swamp", f64::INFINITY),
            Err(SamplingError::InvalidWeight { .. })
        ));
        assert_eq!(slot.weight_of(&"swamp"), 0.0);
    }

    #[test]
    fn combine_sums_shared_cards_and_keeps_order() {
        let a = SlotWeights::from_cards_and_weights(vec!['x', 'y'], &[1.0, 2.0]).expect("a");
        let b = SlotWeights::from_cards_and_weights(vec!['z', 'x'], &[4.0, 3.0]).expect("b");
        let combined = a + b;

        assert_eq!(combined.len(), 3);
        assert_eq!(combined.weight_of(&'x'), 4.0);
        assert_eq!(combined.weight_of(&'z'), 4.0);
        let order: Vec<char> = combined
            .normalize()
            .expect("table")
            .iter()
            .map(|(card, _)| *card)
            .collect();
        assert_eq!(order, vec!['x', 'y', 'z']);
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let slot = SlotWeights::from_cards_and_weights(vec![1, 2, 3, 4], &[0.5, 7.0, 1.25, 3.0])
            .expect("slot");
        let table = slot.normalize().expect("table");
        assert!((table.total() - 1.0).abs() < 1e-9);
        assert!((table.probability_of(&2) - 7.0 / 11.75).abs() < 1e-9);
    }

    #[test]
    fn empty_or_zero_tables_cannot_normalize() {
        assert_eq!(
            SlotWeights::<u8>::new().normalize().expect_err("empty"),
            SamplingError::EmptyTable
        );
        let zero = SlotWeights::from_cards_and_weights(vec![1, 2], &[0.0, 0.0]).expect("slot");
        assert_eq!(zero.normalize().expect_err("zero"), SamplingError::EmptyTable);
    }

    #[test]
    fn zero_weight_cards_are_never_drawn() {
        let slot =
            SlotWeights::from_cards_and_weights(vec!["never", "often", "sometimes"], &[0.0, 3.0, 1.0])
                .expect("slot");
        let table = slot.normalize().expect("table");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5_000 {
            assert_ne!(*table.sample(&mut rng), "never");
        }
    }

    #[test]
    fn sampling_is_reproducible_per_seed() {
        let table = SlotWeights::uniform((0..50).collect::<Vec<u32>>())
            .normalize()
            .expect("table");
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20).map(|_| *table.sample(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(99), draw(99));
        assert_ne!(draw(99), draw(100));
    }

    #[test]
    fn spread_divides_total_evenly() {
        let slot = SlotWeights::spread(vec!['a', 'b', 'c', 'd'], 2.0).expect("slot");
        assert!((slot.weight_of(&'c') - 0.5).abs() < 1e-12);
        assert!(SlotWeights::<char>::spread(Vec::new(), 1.0).expect("empty").is_empty());
    }
}
