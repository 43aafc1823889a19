use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    Special,
    Bonus,
}

impl Rarity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Mythic => "mythic",
            Rarity::Special => "special",
            Rarity::Bonus => "bonus",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<BTreeMap<String, String>>,
}

/// One printing as described by the card database. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub type_line: String,
    #[serde(rename = "set")]
    pub set_code: String,
    pub collector_number: String,
    #[serde(default)]
    pub booster: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_faces: Option<Vec<CardFace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<BTreeMap<String, String>>,
}

impl CardRecord {
    pub fn is_multi_face(&self) -> bool {
        self.card_faces.as_ref().is_some_and(|faces| faces.len() > 1)
    }

    pub fn is_land(&self) -> bool {
        self.type_line.contains("Land")
    }

    pub fn is_basic(&self) -> bool {
        self.type_line.contains("Basic")
    }

    /// Numeric prefix and remaining suffix of the collector number ("12a" → (12, "a")).
    pub fn collector_order(&self) -> (u32, &str) {
        let digits = self
            .collector_number
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.collector_number.len());
        let (number, suffix) = self.collector_number.split_at(digits);
        (number.parse().unwrap_or(u32::MAX), suffix)
    }

    /// Image URL for the front face in the requested format (e.g. "normal").
    pub fn image_url(&self, format: &str) -> Option<&str> {
        if let Some(uris) = &self.image_uris {
            return uris.get(format).map(String::as_str);
        }
        self.card_faces
            .as_ref()
            .and_then(|faces| faces.first())
            .and_then(|face| face.image_uris.as_ref())
            .and_then(|uris| uris.get(format))
            .map(String::as_str)
    }
}
