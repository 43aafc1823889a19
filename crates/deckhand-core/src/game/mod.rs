//! Concrete processes built on the decision protocol.

pub mod blackjack;
pub mod deckbuild;
pub mod draft;
pub mod opening;

pub use blackjack::{Blackjack, BlackjackOption, BlackjackView, Seat};
pub use deckbuild::{Deck, DeckBuild, DeckError, DeckOption, DeckView, LimitedFormat, Zone};
pub use draft::{Draft, DraftPick, DraftView, PassDirection, PassRecord};
pub use opening::{Opening, OpeningOption, OpeningView};
