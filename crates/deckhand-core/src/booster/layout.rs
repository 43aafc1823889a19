use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::booster::slot::{SamplingError, SlotTable, SlotWeights};
use crate::cards::{Card, CardSet, Rarity};

pub const PACK_SIZE: usize = 15;
/// One rare slot in this many opens a mythic.
pub const MYTHIC_ODDS: f64 = 7.4;
pub const FOIL_RATE: f64 = 1.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    RareOrMythic,
    MultiFaceCommonUncommon,
    Uncommon,
    Common,
    MaybeFoil,
    Land,
}

impl SlotKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SlotKind::RareOrMythic => "rare_or_mythic",
            SlotKind::MultiFaceCommonUncommon => "multi_face_common_uncommon",
            SlotKind::Uncommon => "uncommon",
            SlotKind::Common => "common",
            SlotKind::MaybeFoil => "maybe_foil",
            SlotKind::Land => "land",
        }
    }
}

/// Recipe turning a card set into per-slot weight tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BoosterLayout {
    slots: Vec<SlotKind>,
    mythic_odds: f64,
    foil_rate: f64,
}

impl Default for BoosterLayout {
    fn default() -> Self {
        Self::play_booster()
    }
}

impl BoosterLayout {
    pub fn play_booster() -> Self {
        let mut slots = vec![SlotKind::RareOrMythic, SlotKind::MultiFaceCommonUncommon];
        slots.extend([SlotKind::Uncommon; 3]);
        slots.extend([SlotKind::Common; 8]);
        slots.push(SlotKind::MaybeFoil);
        slots.push(SlotKind::Land);
        Self::new(slots)
    }

    pub fn new(slots: Vec<SlotKind>) -> Self {
        Self {
            slots,
            mythic_odds: MYTHIC_ODDS,
            foil_rate: FOIL_RATE,
        }
    }

    pub fn with_mythic_odds(mut self, odds: f64) -> Self {
        self.mythic_odds = odds;
        self
    }

    pub fn with_foil_rate(mut self, rate: f64) -> Self {
        self.foil_rate = rate;
        self
    }

    pub fn slots(&self) -> &[SlotKind] {
        &self.slots
    }

    /// Builds the slot tables for `set`. Slots of the same kind share a table.
    pub fn compose(&self, set: &CardSet) -> Result<BoosterComposition, SamplingError> {
        if self.slots.len() != PACK_SIZE {
            return Err(SamplingError::SlotCount {
                set: set.code().to_string(),
                expected: PACK_SIZE,
                found: self.slots.len(),
            });
        }

        let mut tables: HashMap<SlotKind, Arc<SlotTable<Card>>> = HashMap::new();
        let mut slots = Vec::with_capacity(self.slots.len());
        for kind in self.slots.iter().copied() {
            let table = match tables.get(&kind) {
                Some(table) => Arc::clone(table),
                None => {
                    let weights = self.weights_for(kind, set)?;
                    if weights.is_empty() {
                        return Err(SamplingError::EmptySlot {
                            set: set.code().to_string(),
                            slot: kind.as_str(),
                        });
                    }
                    let table = Arc::new(weights.normalize()?);
                    tables.insert(kind, Arc::clone(&table));
                    table
                }
            };
            slots.push((kind, table));
        }

        Ok(BoosterComposition {
            set_code: set.code().to_string(),
            slots,
        })
    }

    fn weights_for(&self, kind: SlotKind, set: &CardSet) -> Result<SlotWeights<Card>, SamplingError> {
        let weights = match kind {
            SlotKind::RareOrMythic => {
                let mythics = set.select(|card| card.rarity() == Rarity::Mythic);
                let rares = set.select(|card| card.rarity() == Rarity::Rare);
                SlotWeights::spread(mythics, 1.0 / self.mythic_odds)?
                    + SlotWeights::spread(rares, (self.mythic_odds - 1.0) / self.mythic_odds)?
            }
            SlotKind::MultiFaceCommonUncommon => SlotWeights::uniform(set.select(|card| {
                card.is_multi_face() && matches!(card.rarity(), Rarity::Common | Rarity::Uncommon)
            })),
            SlotKind::Uncommon => SlotWeights::uniform(
                set.select(|card| !card.is_multi_face() && card.rarity() == Rarity::Uncommon),
            ),
            SlotKind::Common => SlotWeights::uniform(common_pool(set)),
            SlotKind::MaybeFoil => {
                SlotWeights::spread(set.cards().to_vec(), self.foil_rate)?
                    + SlotWeights::spread(common_pool(set), 1.0 - self.foil_rate)?
            }
            SlotKind::Land => SlotWeights::uniform(
                set.select(|card| card.is_land() && card.rarity() == Rarity::Common),
            ),
        };
        Ok(weights)
    }
}

fn common_pool(set: &CardSet) -> Vec<Card> {
    set.select(|card| !card.is_multi_face() && !card.is_land() && card.rarity() == Rarity::Common)
}

/// Normalized slot tables of one set, in pack order.
#[derive(Debug, Clone)]
pub struct BoosterComposition {
    set_code: String,
    slots: Vec<(SlotKind, Arc<SlotTable<Card>>)>,
}

impl BoosterComposition {
    pub fn set_code(&self) -> &str {
        &self.set_code
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotKind, &SlotTable<Card>)> + '_ {
        self.slots.iter().map(|(kind, table)| (*kind, table.as_ref()))
    }

    pub fn table(&self, kind: SlotKind) -> Option<&SlotTable<Card>> {
        self.slots
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, table)| table.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::SetShape;

    fn neo() -> CardSet {
        CardSet::from_records("neo", SetShape::neo_like("neo").records()).expect("set")
    }

    #[test]
    fn play_booster_has_fifteen_slots() {
        let composition = BoosterLayout::play_booster().compose(&neo()).expect("compose");
        assert_eq!(composition.len(), PACK_SIZE);
        assert_eq!(composition.set_code(), "neo");
        for (_, table) in composition.slots() {
            assert!((table.total() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn wrong_slot_count_fails_at_build_time() {
        let err = BoosterLayout::new(vec![SlotKind::Common; 14])
            .compose(&neo())
            .expect_err("slot count");
        assert!(matches!(
            err,
            SamplingError::SlotCount {
                expected: 15,
                found: 14,
                ..
            }
        ));
    }

    #[test]
    fn mythics_share_one_in_seven_point_four() {
        let composition = BoosterLayout::play_booster().compose(&neo()).expect("compose");
        let table = composition.table(SlotKind::RareOrMythic).expect("rare slot");
        let mythic_share: f64 = table
            .iter()
            .filter(|(card, _)| card.rarity() == Rarity::Mythic)
            .map(|(_, weight)| weight)
            .sum();
        assert!((mythic_share - 1.0 / 7.4).abs() < 1e-9);
        assert_eq!(table.len(), 60);
    }

    #[test]
    fn maybe_foil_sums_common_weight() {
        let set = neo();
        let composition = BoosterLayout::play_booster().compose(&set).expect("compose");
        let table = composition.table(SlotKind::MaybeFoil).expect("foil slot");
        assert_eq!(table.len(), set.len());

        let common = set.select(|card| card.name() == "NEO Common 001").remove(0);
        let rare = set.select(|card| card.name() == "NEO Rare 001").remove(0);
        let expected_common = FOIL_RATE / 302.0 + (1.0 - FOIL_RATE) / 120.0;
        assert!((table.probability_of(&common) - expected_common).abs() < 1e-12);
        assert!((table.probability_of(&rare) - FOIL_RATE / 302.0).abs() < 1e-12);
    }

    #[test]
    fn set_without_lands_cannot_fill_land_slot() {
        let mut shape = SetShape::neo_like("bad");
        shape.common_lands = 0;
        shape.basic_printings = 0;
        let set = CardSet::from_records("bad", shape.records()).expect("set");
        let err = BoosterLayout::play_booster().compose(&set).expect_err("no lands");
        assert_eq!(
            err,
            SamplingError::EmptySlot {
                set: "bad".to_string(),
                slot: "land"
            }
        );
    }
}
