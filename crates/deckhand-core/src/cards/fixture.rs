//! Deterministic stand-in for the card database, used by tests, benches and
//! offline runs.

use crate::cards::record::{CardFace, CardRecord, Rarity};
use crate::cards::set::{CardDataError, CardSource};

const BASIC_NAMES: [&str; 5] = ["Plains", "Island", "Swamp", "Mountain", "Forest"];

/// How many booster cards of each kind a generated set holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetShape {
    pub code: String,
    pub mythics: usize,
    pub rares: usize,
    pub uncommons: usize,
    pub commons: usize,
    pub multi_face_uncommons: usize,
    pub multi_face_commons: usize,
    pub common_lands: usize,
    /// Printed per basic land type, so 2 gives ten basics.
    pub basic_printings: usize,
    /// Cards that exist in the set but never appear in boosters.
    pub promos: usize,
}

impl SetShape {
    /// 302 booster cards laid out like a modern play-booster set.
    pub fn neo_like(code: &str) -> Self {
        Self {
            code: code.to_ascii_lowercase(),
            mythics: 10,
            rares: 50,
            uncommons: 82,
            commons: 120,
            multi_face_uncommons: 10,
            multi_face_commons: 10,
            common_lands: 10,
            basic_printings: 2,
            promos: 5,
        }
    }

    pub fn booster_cards(&self) -> usize {
        self.mythics
            + self.rares
            + self.uncommons
            + self.commons
            + self.multi_face_uncommons
            + self.multi_face_commons
            + self.common_lands
            + self.basic_printings * BASIC_NAMES.len()
    }

    pub fn records(&self) -> Vec<CardRecord> {
        let mut builder = RecordBuilder {
            code: &self.code,
            next_number: 1,
            records: Vec::with_capacity(self.booster_cards() + self.promos),
        };

        builder.push_many(self.commons, "Common", Rarity::Common, "Creature — Human", false);
        builder.push_many(self.uncommons, "Uncommon", Rarity::Uncommon, "Sorcery", false);
        builder.push_many(
            self.multi_face_commons,
            "Twofold Common",
            Rarity::Common,
            "Enchantment — Saga",
            true,
        );
        builder.push_many(
            self.multi_face_uncommons,
            "Twofold Uncommon",
            Rarity::Uncommon,
            "Enchantment — Saga",
            true,
        );
        builder.push_many(self.rares, "Rare", Rarity::Rare, "Artifact", false);
        builder.push_many(
            self.mythics,
            "Mythic",
            Rarity::Mythic,
            "Legendary Creature — Dragon Spirit",
            false,
        );
        builder.push_many(self.common_lands, "Tapland", Rarity::Common, "Land", false);
        for _ in 0..self.basic_printings {
            for basic in BASIC_NAMES {
                let type_line = format!("Basic Land — {basic}");
                builder.push(basic.to_string(), Rarity::Common, &type_line, false, true);
            }
        }
        for index in 0..self.promos {
            let name = format!("{} Promo {:03}", self.code.to_ascii_uppercase(), index + 1);
            builder.push(name, Rarity::Special, "Artifact", false, false);
        }

        builder.records
    }
}

struct RecordBuilder<'a> {
    code: &'a str,
    next_number: usize,
    records: Vec<CardRecord>,
}

impl RecordBuilder<'_> {
    fn push_many(
        &mut self,
        count: usize,
        label: &str,
        rarity: Rarity,
        type_line: &str,
        multi_face: bool,
    ) {
        for index in 0..count {
            let name = format!(
                "{} {} {:03}",
                self.code.to_ascii_uppercase(),
                label,
                index + 1
            );
            self.push(name, rarity, type_line, multi_face, true);
        }
    }

    fn push(
        &mut self,
        name: String,
        rarity: Rarity,
        type_line: &str,
        multi_face: bool,
        booster: bool,
    ) {
        let card_faces = multi_face.then(|| {
            vec![
                CardFace {
                    name: format!("{name} (front)"),
                    type_line: Some(type_line.to_string()),
                    image_uris: None,
                },
                CardFace {
                    name: format!("{name} (back)"),
                    type_line: Some(type_line.to_string()),
                    image_uris: None,
                },
            ]
        });
        self.records.push(CardRecord {
            name,
            rarity,
            type_line: type_line.to_string(),
            set_code: self.code.to_string(),
            collector_number: self.next_number.to_string(),
            booster,
            card_faces,
            image_uris: None,
        });
        self.next_number += 1;
    }
}

/// Card source backed by generated sets.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    shapes: Vec<SetShape>,
}

impl SyntheticSource {
    pub fn new(shapes: Vec<SetShape>) -> Self {
        Self { shapes }
    }
}

impl CardSource for SyntheticSource {
    fn records_for_set(&self, set_code: &str) -> Result<Vec<CardRecord>, CardDataError> {
        self.shapes
            .iter()
            .find(|shape| shape.code.eq_ignore_ascii_case(set_code))
            .map(SetShape::records)
            .ok_or_else(|| CardDataError::UnknownSet(set_code.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::set::CardSet;

    #[test]
    fn neo_like_shape_has_302_booster_cards() {
        let shape = SetShape::neo_like("neo");
        assert_eq!(shape.booster_cards(), 302);

        let set = CardSet::from_records("neo", shape.records()).expect("set");
        assert_eq!(set.len(), 302);
        assert_eq!(set.basics().len(), 5);
        assert_eq!(set.select(|card| card.is_multi_face()).len(), 20);
        assert_eq!(set.select(|card| card.rarity() == Rarity::Mythic).len(), 10);
    }

    #[test]
    fn unknown_set_is_reported() {
        let source = SyntheticSource::new(vec![SetShape::neo_like("neo")]);
        assert!(matches!(
            source.records_for_set("dmu"),
            Err(CardDataError::UnknownSet(code)) if code == "dmu"
        ));
    }
}
