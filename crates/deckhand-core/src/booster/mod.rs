//! Booster pack generation: weighted slot tables, per-set compositions and
//! the box that opens packs from them.

pub mod cache;
pub mod layout;
pub mod pack;
pub mod slot;

pub use cache::{BoosterCache, BoosterError};
pub use layout::{BoosterComposition, BoosterLayout, SlotKind};
pub use pack::{BoosterBox, SEALED_PACKS};
pub use slot::{SamplingError, SlotTable, SlotWeights};
