use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::cards::card::Card;
use crate::cards::record::CardRecord;

#[derive(Debug, Error)]
pub enum CardDataError {
    #[error("failed to read card data {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse card data {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("set '{0}' has no booster cards")]
    UnknownSet(String),
    #[error("set '{set}' lists collector number {number} more than once")]
    DuplicateCard { set: String, number: String },
}

/// Where card records come from. Implementations only need to return the
/// records of one set; filtering and ordering happen in [`CardSet`].
pub trait CardSource: Send + Sync {
    fn records_for_set(&self, set_code: &str) -> Result<Vec<CardRecord>, CardDataError>;
}

/// Reads `<root>/<set_code>.json`, a JSON array of card records.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, set_code: &str) -> PathBuf {
        self.root.join(format!("{}.json", set_code.to_ascii_lowercase()))
    }
}

impl CardSource for JsonDirSource {
    fn records_for_set(&self, set_code: &str) -> Result<Vec<CardRecord>, CardDataError> {
        let path = self.path_for(set_code);
        let file = File::open(&path).map_err(|source| CardDataError::Read {
            source,
            path: path.clone(),
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| CardDataError::Parse { source, path })
    }
}

/// Booster-legal cards of one set, ordered by collector number.
#[derive(Debug, Clone)]
pub struct CardSet {
    code: String,
    cards: Vec<Card>,
}

impl CardSet {
    pub fn from_records(
        code: &str,
        records: impl IntoIterator<Item = CardRecord>,
    ) -> Result<Self, CardDataError> {
        let code = code.to_ascii_lowercase();
        let mut records: Vec<CardRecord> = records
            .into_iter()
            .filter(|record| record.booster && record.set_code.eq_ignore_ascii_case(&code))
            .collect();
        if records.is_empty() {
            return Err(CardDataError::UnknownSet(code));
        }

        records.sort_by(|a, b| a.collector_order().cmp(&b.collector_order()));

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.collector_number.as_str()) {
                return Err(CardDataError::DuplicateCard {
                    set: code,
                    number: record.collector_number.clone(),
                });
            }
        }

        let cards = records.into_iter().map(Card::new).collect();
        Ok(Self { code, cards })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn select(&self, mut predicate: impl FnMut(&Card) -> bool) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|card| predicate(card))
            .cloned()
            .collect()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.iter().any(|candidate| candidate == card)
    }

    /// One handle per distinct basic land name, in collector order.
    pub fn basics(&self) -> Vec<Card> {
        let mut names = HashSet::new();
        self.cards
            .iter()
            .filter(|card| card.is_basic() && names.insert(card.name()))
            .cloned()
            .collect()
    }
}

/// Loads each set once and shares it afterwards.
pub struct CardLibrary {
    source: Box<dyn CardSource>,
    sets: Mutex<HashMap<String, Arc<CardSet>>>,
}

impl CardLibrary {
    pub fn new(source: Box<dyn CardSource>) -> Self {
        Self {
            source,
            sets: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_json_dir(root: impl AsRef<Path>) -> Self {
        Self::new(Box::new(JsonDirSource::new(root.as_ref())))
    }

    pub fn set(&self, set_code: &str) -> Result<Arc<CardSet>, CardDataError> {
        let key = set_code.to_ascii_lowercase();
        let mut sets = self.sets.lock();
        if let Some(set) = sets.get(&key) {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(CardSet::from_records(
            &key,
            self.source.records_for_set(&key)?,
        )?);
        debug!(target: "deckhand_core::cards", set = %key, cards = set.len(), "loaded card set");
        sets.insert(key, Arc::clone(&set));
        Ok(set)
    }

    pub fn loaded_sets(&self) -> usize {
        self.sets.lock().len()
    }
}

impl std::fmt::Debug for CardLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardLibrary")
            .field("loaded_sets", &self.loaded_sets())
            .finish()
    }
}
