use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::cards::record::{CardRecord, Rarity};

/// Shared handle to one card record.
///
/// Equality and hashing use the printing key (set code and collector number),
/// so two handles for the same printing compare equal. [`Card::same`] is the
/// stricter reference identity: a [`CardSet`](crate::cards::CardSet) builds one
/// handle per record, and every booster draw hands out one of those handles.
#[derive(Clone)]
pub struct Card(Arc<CardRecord>);

impl Card {
    pub fn new(record: CardRecord) -> Self {
        Self(Arc::new(record))
    }

    pub fn record(&self) -> &CardRecord {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn rarity(&self) -> Rarity {
        self.0.rarity
    }

    pub fn set_code(&self) -> &str {
        &self.0.set_code
    }

    pub fn collector_number(&self) -> &str {
        &self.0.collector_number
    }

    pub fn type_line(&self) -> &str {
        &self.0.type_line
    }

    pub fn is_land(&self) -> bool {
        self.0.is_land()
    }

    pub fn is_basic(&self) -> bool {
        self.0.is_basic()
    }

    pub fn is_multi_face(&self) -> bool {
        self.0.is_multi_face()
    }

    pub fn same(&self, other: &Card) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
            || (self.0.set_code == other.0.set_code
                && self.0.collector_number == other.0.collector_number)
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.set_code.hash(state);
        self.0.collector_number.hash(state);
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} #{})",
            self.0.name, self.0.set_code, self.0.collector_number
        )
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.name)
    }
}

#[derive(Serialize)]
struct CardKey<'a> {
    name: &'a str,
    set: &'a str,
    number: &'a str,
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CardKey {
            name: &self.0.name,
            set: &self.0.set_code,
            number: &self.0.collector_number,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str) -> CardRecord {
        CardRecord {
            name: format!("Card {number}"),
            rarity: Rarity::Common,
            type_line: "Creature — Rat Ninja".to_string(),
            set_code: "neo".to_string(),
            collector_number: number.to_string(),
            booster: true,
            card_faces: None,
            image_uris: None,
        }
    }

    #[test]
    fn equality_follows_printing_key_identity_follows_handle() {
        let a = Card::new(record("7"));
        let b = Card::new(record("7"));
        let c = a.clone();

        assert_eq!(a, b);
        assert!(!a.same(&b));
        assert!(a.same(&c));
        assert_ne!(a, Card::new(record("8")));
    }

    #[test]
    fn serializes_as_printing_key() {
        let card = Card::new(record("12"));
        let json = serde_json::to_string(&card).expect("serialize");
        assert_eq!(json, r#"{"name":"Card 12","set":"neo","number":"12"}"#);
    }
}
