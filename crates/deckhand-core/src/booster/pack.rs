use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::booster::layout::BoosterComposition;
use crate::booster::slot::SlotTable;
use crate::cards::Card;

pub const SEALED_PACKS: usize = 6;
const MAX_REDRAWS: usize = 32;

/// Opens packs from one set's composition.
#[derive(Debug, Clone)]
pub struct BoosterBox {
    composition: Arc<BoosterComposition>,
}

impl BoosterBox {
    pub fn new(composition: Arc<BoosterComposition>) -> Self {
        Self { composition }
    }

    pub fn composition(&self) -> &BoosterComposition {
        &self.composition
    }

    pub fn set_code(&self) -> &str {
        self.composition.set_code()
    }

    /// One card per slot, no card twice in the same pack.
    ///
    /// A duplicate is redrawn a bounded number of times; after that the slot's
    /// first unused card with positive weight is taken. Only when every
    /// drawable card of the slot is already in the pack is a duplicate kept.
    pub fn open<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Card> {
        let mut pack: Vec<Card> = Vec::with_capacity(self.composition.len());
        for (kind, table) in self.composition.slots() {
            let card = draw_distinct(table, &pack, rng);
            trace!(target: "deckhand_core::booster", slot = kind.as_str(), card = card.name(), "slot drawn");
            pack.push(card);
        }
        pack
    }

    pub fn open_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Vec<Card>> {
        (0..count).map(|_| self.open(rng)).collect()
    }

    /// Card pool for sealed deck: `packs` boosters opened and concatenated.
    pub fn sealed_pool<R: Rng + ?Sized>(&self, packs: usize, rng: &mut R) -> Vec<Card> {
        self.open_many(packs, rng).into_iter().flatten().collect()
    }
}

fn draw_distinct<R: Rng + ?Sized>(table: &SlotTable<Card>, pack: &[Card], rng: &mut R) -> Card {
    let in_pack = |card: &Card| pack.iter().any(|existing| existing.same(card));

    let mut card = table.sample(rng);
    for _ in 0..MAX_REDRAWS {
        if !in_pack(card) {
            return card.clone();
        }
        card = table.sample(rng);
    }
    if !in_pack(card) {
        return card.clone();
    }

    table
        .iter()
        .find(|(candidate, weight)| *weight > 0.0 && !in_pack(*candidate))
        .map_or_else(|| card.clone(), |(candidate, _)| candidate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::layout::BoosterLayout;
    use crate::booster::slot::SlotWeights;
    use crate::cards::{CardSet, SetShape};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn neo_box() -> BoosterBox {
        let set = CardSet::from_records("neo", SetShape::neo_like("neo").records()).expect("set");
        let composition = BoosterLayout::play_booster().compose(&set).expect("compose");
        BoosterBox::new(Arc::new(composition))
    }

    #[test]
    fn packs_have_fifteen_distinct_cards() {
        let boxed = neo_box();
        let mut rng = StdRng::seed_from_u64(3);
        for pack in boxed.open_many(200, &mut rng) {
            assert_eq!(pack.len(), 15);
            for (i, card) in pack.iter().enumerate() {
                assert!(pack[i + 1..].iter().all(|other| !other.same(card)));
            }
        }
    }

    #[test]
    fn sealed_pool_is_ninety_cards() {
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(neo_box().sealed_pool(SEALED_PACKS, &mut rng).len(), 90);
    }

    #[test]
    fn exhausted_slot_falls_back_to_unused_card() {
        let cards = neo_box().composition().table(crate::booster::SlotKind::Land).map(|table| {
            table.iter().take(2).map(|(card, _)| card.clone()).collect::<Vec<_>>()
        });
        let cards = cards.expect("land slot");
        let table = SlotWeights::from_cards_and_weights(cards.clone(), &[1_000_000.0, 1e-9])
            .expect("weights")
            .normalize()
            .expect("table");
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = draw_distinct(&table, &cards[..1], &mut rng);
        assert!(drawn.same(&cards[1]));

        let drawn = draw_distinct(&table, &cards, &mut rng);
        assert!(cards.iter().any(|card| card.same(&drawn)));
    }
}
