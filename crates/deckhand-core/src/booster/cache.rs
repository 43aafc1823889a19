use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::booster::layout::{BoosterComposition, BoosterLayout};
use crate::booster::slot::SamplingError;
use crate::cards::{CardDataError, CardLibrary};

#[derive(Debug, Error)]
pub enum BoosterError {
    #[error(transparent)]
    Cards(#[from] CardDataError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

/// Booster compositions keyed by set code. Each one is built on first request
/// and shared read-only afterwards.
#[derive(Debug)]
pub struct BoosterCache {
    library: CardLibrary,
    layout: BoosterLayout,
    compositions: Mutex<HashMap<String, Arc<BoosterComposition>>>,
}

impl BoosterCache {
    pub fn new(library: CardLibrary) -> Self {
        Self::with_layout(library, BoosterLayout::play_booster())
    }

    pub fn with_layout(library: CardLibrary, layout: BoosterLayout) -> Self {
        Self {
            library,
            layout,
            compositions: Mutex::new(HashMap::new()),
        }
    }

    pub fn library(&self) -> &CardLibrary {
        &self.library
    }

    pub fn composition(&self, set_code: &str) -> Result<Arc<BoosterComposition>, BoosterError> {
        let key = set_code.to_ascii_lowercase();
        let mut compositions = self.compositions.lock();
        if let Some(composition) = compositions.get(&key) {
            return Ok(Arc::clone(composition));
        }

        let set = self.library.set(&key)?;
        let composition = Arc::new(self.layout.compose(&set)?);
        debug!(
            target: "deckhand_core::booster",
            set = %key,
            slots = composition.len(),
            cards = set.len(),
            "built booster composition"
        );
        compositions.insert(key, Arc::clone(&composition));
        Ok(composition)
    }

    pub fn cached_sets(&self) -> usize {
        self.compositions.lock().len()
    }
}
