//! Limited deck construction as a single-player process.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::cards::{Card, CardSet};
use crate::protocol::{Choice, MessageBundle, Process, ProcessError, Reply, Views};

pub const MIN_MAIN_DECK: usize = 40;
pub const DEFAULT_MAX_CHOICES: usize = 1_000;

type Bundle = MessageBundle<DeckView, DeckOption>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Main,
    Sideboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("{0:?} is neither in the sideboard nor a basic land")]
    NotAvailable(Card),
    #[error("{0:?} is not in the main deck")]
    NotInMain(Card),
}

/// Main deck, sideboard and the basic lands that can be added without limit.
/// The pool is what the player brought; basic lands added on top of it are
/// extra copies and leave the deck again when removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    main: Vec<Card>,
    sideboard: Vec<Card>,
    basics: Vec<Card>,
    pool: Vec<Card>,
}

impl Deck {
    pub fn new(main: Vec<Card>, sideboard: Vec<Card>, basics: Vec<Card>) -> Self {
        let pool = main.iter().chain(sideboard.iter()).cloned().collect();
        Self {
            main,
            sideboard,
            basics,
            pool,
        }
    }

    /// Starts with the whole pool in the sideboard.
    pub fn from_pool(pool: Vec<Card>, basics: Vec<Card>) -> Self {
        Self::new(Vec::new(), pool, basics)
    }

    pub fn main(&self) -> &[Card] {
        &self.main
    }

    pub fn sideboard(&self) -> &[Card] {
        &self.sideboard
    }

    pub fn basics(&self) -> &[Card] {
        &self.basics
    }

    /// The cards the deck was built from, in their original order.
    pub fn pool(&self) -> &[Card] {
        &self.pool
    }

    /// Every card currently held: main deck then sideboard.
    pub fn cards(&self) -> impl Iterator<Item = &Card> + '_ {
        self.main.iter().chain(self.sideboard.iter())
    }

    /// Basic lands not already offered through a sideboard copy.
    pub fn addable_basics(&self) -> impl Iterator<Item = &Card> + '_ {
        self.basics
            .iter()
            .filter(|basic| !self.sideboard.contains(*basic))
    }

    /// Moves a sideboard card to the main deck, or adds a copy of a basic land.
    pub fn pick(&mut self, card: &Card) -> Result<(), DeckError> {
        let position = self
            .sideboard
            .iter()
            .position(|c| c.same(card))
            .or_else(|| self.sideboard.iter().position(|c| c == card));
        if let Some(position) = position {
            let card = self.sideboard.remove(position);
            self.main.push(card);
            return Ok(());
        }
        if let Some(basic) = self.basics.iter().find(|basic| *basic == card) {
            self.main.push(basic.clone());
            return Ok(());
        }
        Err(DeckError::NotAvailable(card.clone()))
    }

    /// Moves a main deck card back to the sideboard. Extra basic land copies
    /// are dropped instead.
    pub fn unpick(&mut self, card: &Card) -> Result<(), DeckError> {
        let position = self
            .main
            .iter()
            .position(|c| c.same(card))
            .or_else(|| self.main.iter().position(|c| c == card))
            .ok_or_else(|| DeckError::NotInMain(card.clone()))?;
        let card = self.main.remove(position);
        // Copies are interchangeable, so any copy the pool is missing goes back.
        if copies(&self.sideboard, &card) < copies(&self.pool, &card) {
            self.sideboard.push(card);
        }
        Ok(())
    }
}

fn copies(cards: &[Card], card: &Card) -> usize {
    cards.iter().filter(|c| *c == card).count()
}

/// Sealed/draft legality: every card comes from the set, main deck of at least 40.
#[derive(Debug, Clone)]
pub struct LimitedFormat {
    set: Arc<CardSet>,
    min_main: usize,
}

impl LimitedFormat {
    pub fn new(set: Arc<CardSet>) -> Self {
        Self {
            set,
            min_main: MIN_MAIN_DECK,
        }
    }

    pub fn with_min_main(mut self, min_main: usize) -> Self {
        self.min_main = min_main;
        self
    }

    pub fn set(&self) -> &CardSet {
        &self.set
    }

    pub fn is_legal(&self, deck: &Deck) -> bool {
        deck.main().len() >= self.min_main && deck.cards().all(|card| self.set.contains(card))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DeckView {
    Configuration {
        main: Vec<Card>,
        sideboard: Vec<Card>,
        basics: Vec<Card>,
    },
    Moved {
        card: Card,
        to: Zone,
        main_size: usize,
    },
}

impl fmt::Display for DeckView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckView::Configuration {
                main, sideboard, ..
            } => write!(
                f,
                "Main deck {} cards, sideboard {} cards",
                main.len(),
                sideboard.len()
            ),
            DeckView::Moved {
                card,
                to,
                main_size,
            } => {
                let zone = match to {
                    Zone::Main => "main deck",
                    Zone::Sideboard => "sideboard",
                };
                write!(f, "{card} moved to {zone} (main deck now {main_size})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "option", content = "card", rename_all = "snake_case")]
pub enum DeckOption {
    Finish,
    Pick(Card),
    Unpick(Card),
}

impl fmt::Display for DeckOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckOption::Finish => f.write_str("Finish"),
            DeckOption::Pick(card) => write!(f, "Add {card}"),
            DeckOption::Unpick(card) => write!(f, "Remove {card}"),
        }
    }
}

enum BuildStage {
    Start,
    Awaiting(Choice<DeckOption>),
    Finished,
}

/// Lets one player move cards between sideboard and main deck until they
/// finish with a legal deck.
pub struct DeckBuild {
    deck: Deck,
    format: LimitedFormat,
    max_choices: usize,
    answered: usize,
    stage: BuildStage,
}

impl DeckBuild {
    pub fn new(deck: Deck, format: LimitedFormat) -> Self {
        Self {
            deck,
            format,
            max_choices: DEFAULT_MAX_CHOICES,
            answered: 0,
            stage: BuildStage::Start,
        }
    }

    pub fn with_max_choices(mut self, max_choices: usize) -> Self {
        self.max_choices = max_choices;
        self
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }

    pub fn choices_answered(&self) -> usize {
        self.answered
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, BuildStage::Finished)
    }

    pub fn is_legal(&self) -> bool {
        self.format.is_legal(&self.deck)
    }

    fn next_choice(&self) -> Result<Choice<DeckOption>, ProcessError> {
        let mut options = Vec::with_capacity(
            1 + self.deck.sideboard().len() + self.deck.basics().len() + self.deck.main().len(),
        );
        if self.is_legal() {
            options.push(DeckOption::Finish);
        }
        options.extend(self.deck.sideboard().iter().cloned().map(DeckOption::Pick));
        options.extend(self.deck.addable_basics().cloned().map(DeckOption::Pick));
        options.extend(self.deck.main().iter().cloned().map(DeckOption::Unpick));

        Ok(Choice::new(
            0,
            format!(
                "Build your deck ({} main, {} sideboard)",
                self.deck.main().len(),
                self.deck.sideboard().len()
            ),
            options,
        )?)
    }

    fn apply(&mut self, option: &DeckOption) -> Result<Option<DeckView>, ProcessError> {
        let (card, to) = match option {
            DeckOption::Finish => return Ok(None),
            DeckOption::Pick(card) => {
                self.deck.pick(card).map_err(|err| ProcessError::rules(err.to_string()))?;
                (card.clone(), Zone::Main)
            }
            DeckOption::Unpick(card) => {
                self.deck
                    .unpick(card)
                    .map_err(|err| ProcessError::rules(err.to_string()))?;
                (card.clone(), Zone::Sideboard)
            }
        };
        Ok(Some(DeckView::Moved {
            card,
            to,
            main_size: self.deck.main().len(),
        }))
    }
}

impl Process for DeckBuild {
    type View = DeckView;
    type Opt = DeckOption;

    fn num_players(&self) -> usize {
        1
    }

    fn resume(&mut self, reply: Reply) -> Result<Option<Bundle>, ProcessError> {
        match std::mem::replace(&mut self.stage, BuildStage::Finished) {
            BuildStage::Start => {
                reply.advance()?;
                let view = DeckView::Configuration {
                    main: self.deck.main().to_vec(),
                    sideboard: self.deck.sideboard().to_vec(),
                    basics: self.deck.basics().to_vec(),
                };
                let choice = self.next_choice()?;
                self.stage = BuildStage::Awaiting(choice.clone());
                Ok(Some(Bundle::of_views(Views::new(vec![view])).with_choice(choice)))
            }
            BuildStage::Awaiting(choice) => {
                let index = reply.pick(&choice)?;
                self.answered += 1;
                let option = choice
                    .option(index)
                    .ok_or_else(|| ProcessError::rules("picked option vanished"))?;
                let Some(view) = self.apply(option)? else {
                    return Ok(None);
                };
                if self.answered >= self.max_choices {
                    return Err(ProcessError::BuildTimeout {
                        limit: self.max_choices,
                    });
                }
                let next = self.next_choice()?;
                self.stage = BuildStage::Awaiting(next.clone());
                Ok(Some(Bundle::of_views(Views::new(vec![view])).with_choice(next)))
            }
            BuildStage::Finished => Ok(None),
        }
    }
}
