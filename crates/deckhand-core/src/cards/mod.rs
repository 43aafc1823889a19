//! Card data: records as published by the card database, identity-bearing
//! handles, per-set collections and the sources they are loaded from.

pub mod card;
pub mod display;
pub mod fixture;
pub mod record;
pub mod set;

pub use card::Card;
pub use display::{CardDisplay, NullDisplay, TextDisplay};
pub use fixture::{SetShape, SyntheticSource};
pub use record::{CardFace, CardRecord, Rarity};
pub use set::{CardDataError, CardLibrary, CardSet, CardSource, JsonDirSource};
