//! Starting a game: pick who plays first, then each player draws an opening
//! hand and keeps or mulligans it.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::cards::Card;
use crate::protocol::{
    Choice, MessageBundle, Process, ProcessError, Reply, Sequence, Step, Views,
};

pub const OPENING_HAND: usize = 7;
pub const MAX_MULLIGANS: usize = 7;
pub const MAX_SEATS: usize = 8;

type Bundle = MessageBundle<OpeningView, OpeningOption>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum OpeningView {
    Library { player: usize, size: usize },
    Starting { player: usize, chosen_by: usize },
    /// Private: the recipient's own hand.
    Hand { cards: Vec<Card> },
    /// What everyone else learns about a player's hand.
    HandSize { player: usize, size: usize },
    Mulligan { player: usize, count: usize },
    Kept { player: usize, hand_size: usize },
}

impl fmt::Display for OpeningView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpeningView::Library { player, size } => {
                write!(f, "Player {player} shuffles a library of {size} cards")
            }
            OpeningView::Starting { player, chosen_by } => {
                write!(f, "Player {chosen_by} chooses Player {player} to play first")
            }
            OpeningView::Hand { cards } => {
                let names: Vec<&str> = cards.iter().map(Card::name).collect();
                write!(f, "Your hand: {}", names.join(", "))
            }
            OpeningView::HandSize { player, size } => {
                write!(f, "Player {player} draws {size} cards")
            }
            OpeningView::Mulligan { player, count } => {
                write!(f, "Player {player} mulligans ({count})")
            }
            OpeningView::Kept { player, hand_size } => {
                write!(f, "Player {player} keeps {hand_size} cards")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "option", rename_all = "snake_case")]
pub enum OpeningOption {
    GoFirst { player: usize },
    Keep,
    Mulligan,
    Bottom { card: Card },
}

impl fmt::Display for OpeningOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpeningOption::GoFirst { player } => write!(f, "Player {player} goes first"),
            OpeningOption::Keep => f.write_str("Keep"),
            OpeningOption::Mulligan => f.write_str("Mulligan"),
            OpeningOption::Bottom { card } => write!(f, "Bottom {card}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PlayerZones {
    library: VecDeque<Card>,
    hand: Vec<Card>,
    mulligans: usize,
}

struct OpeningTable {
    rng: StdRng,
    players: Vec<PlayerZones>,
    first: Option<usize>,
}

impl OpeningTable {
    fn count(&self) -> usize {
        self.players.len()
    }

    fn shuffle_library(&mut self, player: usize) {
        let zones = &mut self.players[player];
        let mut cards: Vec<Card> = zones.hand.drain(..).chain(zones.library.drain(..)).collect();
        cards.shuffle(&mut self.rng);
        zones.library = cards.into();
    }

    /// Shuffles the hand back in, draws a fresh hand and reports it.
    fn draw_hand(&mut self, player: usize, bundle: &mut Bundle) {
        self.shuffle_library(player);
        let zones = &mut self.players[player];
        let draw = OPENING_HAND.min(zones.library.len());
        zones.hand = zones.library.drain(..draw).collect();
        let cards = zones.hand.clone();
        bundle.push_views(Views::from_fn(self.count(), |recipient| {
            if recipient == player {
                OpeningView::Hand {
                    cards: cards.clone(),
                }
            } else {
                OpeningView::HandSize {
                    player,
                    size: cards.len(),
                }
            }
        }));
    }
}

/// A randomly selected player decides who plays first.
struct ChooseStarter {
    chooser: usize,
    pending: Option<Choice<OpeningOption>>,
    announced: Option<usize>,
}

impl Sequence<OpeningTable> for ChooseStarter {
    type View = OpeningView;
    type Opt = OpeningOption;
    type Output = usize;

    fn resume(
        &mut self,
        table: &mut OpeningTable,
        reply: Reply,
    ) -> Result<Step<Bundle, usize>, ProcessError> {
        if let Some(first) = self.announced {
            reply.advance()?;
            return Ok(Step::Done(first));
        }

        if let Some(choice) = self.pending.take() {
            let index = reply.pick(&choice)?;
            let first = match choice.option(index) {
                Some(OpeningOption::GoFirst { player }) => *player,
                _ => return Err(ProcessError::rules("starting player choice was not a player")),
            };
            self.announced = Some(first);
            return Ok(Step::Yield(Bundle::of_views(Views::uniform(
                OpeningView::Starting {
                    player: first,
                    chosen_by: self.chooser,
                },
                table.count(),
            ))));
        }

        reply.advance()?;
        let mut bundle = Bundle::new();
        for player in 0..table.count() {
            table.shuffle_library(player);
            bundle.push_views(Views::uniform(
                OpeningView::Library {
                    player,
                    size: table.players[player].library.len(),
                },
                table.count(),
            ));
        }
        self.chooser = table.rng.gen_range(0..table.count());
        let options = (0..table.count())
            .map(|player| OpeningOption::GoFirst { player })
            .collect();
        let choice = Choice::new(self.chooser, "Choose who plays first", options)?;
        self.pending = Some(choice.clone());
        Ok(Step::Yield(bundle.with_choice(choice)))
    }
}

/// After keeping a hand with `remaining` mulligans taken, the player puts
/// that many cards on the bottom, one choice per card.
struct BottomCards {
    player: usize,
    remaining: usize,
    pending: Option<Choice<OpeningOption>>,
}

impl Sequence<OpeningTable> for BottomCards {
    type View = OpeningView;
    type Opt = OpeningOption;
    type Output = ();

    fn resume(
        &mut self,
        table: &mut OpeningTable,
        reply: Reply,
    ) -> Result<Step<Bundle>, ProcessError> {
        match self.pending.take() {
            Some(choice) => {
                let index = reply.pick(&choice)?;
                let zones = &mut table.players[self.player];
                if index >= zones.hand.len() {
                    return Err(ProcessError::rules("bottomed card is not in hand"));
                }
                let card = zones.hand.remove(index);
                zones.library.push_back(card);
                self.remaining -= 1;
            }
            None => reply.advance()?,
        }

        let hand = &table.players[self.player].hand;
        if self.remaining == 0 || hand.is_empty() {
            return Ok(Step::Done(()));
        }
        let options = hand
            .iter()
            .cloned()
            .map(|card| OpeningOption::Bottom { card })
            .collect();
        let choice = Choice::new(
            self.player,
            format!(
                "Put a card on the bottom of your library ({} left)",
                self.remaining
            ),
            options,
        )?;
        self.pending = Some(choice.clone());
        Ok(Step::Yield(Bundle::of_choice(choice)))
    }
}

enum MulliganPhase {
    Draw,
    Awaiting(Choice<OpeningOption>),
    Bottoming(BottomCards),
    Announce,
    Done,
}

/// One player's keep-or-mulligan loop.
struct KeepOrMulligan {
    player: usize,
    phase: MulliganPhase,
}

impl KeepOrMulligan {
    fn new(player: usize) -> Self {
        Self {
            player,
            phase: MulliganPhase::Draw,
        }
    }

    fn offer(&self, table: &OpeningTable) -> Result<Choice<OpeningOption>, ProcessError> {
        let mulligans = table.players[self.player].mulligans;
        let mut options = vec![OpeningOption::Keep];
        if mulligans < MAX_MULLIGANS {
            options.push(OpeningOption::Mulligan);
        }
        Ok(Choice::new(
            self.player,
            format!("Keep this hand? ({mulligans} mulligans taken)"),
            options,
        )?)
    }

    fn kept(&self, table: &OpeningTable) -> Bundle {
        Bundle::of_views(Views::uniform(
            OpeningView::Kept {
                player: self.player,
                hand_size: table.players[self.player].hand.len(),
            },
            table.count(),
        ))
    }
}

impl Sequence<OpeningTable> for KeepOrMulligan {
    type View = OpeningView;
    type Opt = OpeningOption;
    type Output = ();

    fn resume(
        &mut self,
        table: &mut OpeningTable,
        mut reply: Reply,
    ) -> Result<Step<Bundle>, ProcessError> {
        loop {
            match std::mem::replace(&mut self.phase, MulliganPhase::Done) {
                MulliganPhase::Draw => {
                    reply.advance()?;
                    let mut bundle = Bundle::new();
                    table.draw_hand(self.player, &mut bundle);
                    let choice = self.offer(table)?;
                    self.phase = MulliganPhase::Awaiting(choice.clone());
                    return Ok(Step::Yield(bundle.with_choice(choice)));
                }
                MulliganPhase::Awaiting(choice) => {
                    let index = reply.pick(&choice)?;
                    if choice.option(index) == Some(&OpeningOption::Mulligan) {
                        let zones = &mut table.players[self.player];
                        zones.mulligans += 1;
                        let count = zones.mulligans;
                        let mut bundle = Bundle::of_views(Views::uniform(
                            OpeningView::Mulligan {
                                player: self.player,
                                count,
                            },
                            table.count(),
                        ));
                        table.draw_hand(self.player, &mut bundle);
                        let choice = self.offer(table)?;
                        self.phase = MulliganPhase::Awaiting(choice.clone());
                        return Ok(Step::Yield(bundle.with_choice(choice)));
                    }
                    self.phase = MulliganPhase::Bottoming(BottomCards {
                        player: self.player,
                        remaining: table.players[self.player].mulligans,
                        pending: None,
                    });
                    reply = Reply::Advance;
                }
                MulliganPhase::Bottoming(mut bottom) => {
                    let step = bottom.resume(table, reply);
                    self.phase = MulliganPhase::Bottoming(bottom);
                    crate::yield_from!(step);
                    self.phase = MulliganPhase::Announce;
                    return Ok(Step::Yield(self.kept(table)));
                }
                MulliganPhase::Announce => {
                    reply.advance()?;
                    return Ok(Step::Done(()));
                }
                MulliganPhase::Done => {
                    return Err(ProcessError::rules("mulligan sequence resumed after it ended"));
                }
            }
        }
    }
}

/// Every player's mulligan decisions, starting with the first player.
struct Mulligans {
    order: Vec<usize>,
    position: usize,
    current: KeepOrMulligan,
}

impl Sequence<OpeningTable> for Mulligans {
    type View = OpeningView;
    type Opt = OpeningOption;
    type Output = ();

    fn resume(
        &mut self,
        table: &mut OpeningTable,
        mut reply: Reply,
    ) -> Result<Step<Bundle>, ProcessError> {
        loop {
            crate::yield_from!(self.current.resume(table, reply));
            self.position += 1;
            let Some(&player) = self.order.get(self.position) else {
                return Ok(Step::Done(()));
            };
            self.current = KeepOrMulligan::new(player);
            reply = Reply::Advance;
        }
    }
}

enum Stage {
    Starter(ChooseStarter),
    Mulligans(Mulligans),
    Finished,
}

/// The opening process over each player's main deck.
pub struct Opening {
    table: OpeningTable,
    stage: Stage,
}

impl Opening {
    pub fn new(decks: Vec<Vec<Card>>, rng: StdRng) -> Result<Self, ProcessError> {
        if !(1..=MAX_SEATS).contains(&decks.len()) {
            return Err(ProcessError::SeatCount {
                process: "opening",
                min: 1,
                max: MAX_SEATS,
                found: decks.len(),
            });
        }
        if let Some(player) = decks.iter().position(|deck| deck.len() < OPENING_HAND) {
            return Err(ProcessError::rules(format!(
                "player {player} has fewer than {OPENING_HAND} cards in their deck"
            )));
        }

        let players = decks
            .into_iter()
            .map(|deck| PlayerZones {
                library: deck.into(),
                ..PlayerZones::default()
            })
            .collect();
        Ok(Self {
            table: OpeningTable {
                rng,
                players,
                first: None,
            },
            stage: Stage::Starter(ChooseStarter {
                chooser: 0,
                pending: None,
                announced: None,
            }),
        })
    }

    pub fn with_seed(decks: Vec<Vec<Card>>, seed: u64) -> Result<Self, ProcessError> {
        Self::new(decks, StdRng::seed_from_u64(seed))
    }

    pub fn first_player(&self) -> Option<usize> {
        self.table.first
    }

    pub fn hand(&self, player: usize) -> &[Card] {
        self.table
            .players
            .get(player)
            .map_or(&[][..], |zones| zones.hand.as_slice())
    }

    /// Library from top to bottom.
    pub fn library(&self, player: usize) -> impl Iterator<Item = &Card> + '_ {
        self.table
            .players
            .get(player)
            .into_iter()
            .flat_map(|zones| zones.library.iter())
    }

    pub fn mulligans(&self, player: usize) -> usize {
        self.table
            .players
            .get(player)
            .map_or(0, |zones| zones.mulligans)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }
}

impl Process for Opening {
    type View = OpeningView;
    type Opt = OpeningOption;

    fn num_players(&self) -> usize {
        self.table.count()
    }

    fn resume(&mut self, mut reply: Reply) -> Result<Option<Bundle>, ProcessError> {
        loop {
            match &mut self.stage {
                Stage::Starter(seq) => match seq.resume(&mut self.table, reply)? {
                    Step::Yield(bundle) => return Ok(Some(bundle)),
                    Step::Done(first) => {
                        self.table.first = Some(first);
                        let count = self.table.count();
                        let order: Vec<usize> = (0..count).map(|i| (first + i) % count).collect();
                        self.stage = Stage::Mulligans(Mulligans {
                            current: KeepOrMulligan::new(first),
                            order,
                            position: 0,
                        });
                        reply = Reply::Advance;
                    }
                },
                Stage::Mulligans(seq) => match seq.resume(&mut self.table, reply)? {
                    Step::Yield(bundle) => return Ok(Some(bundle)),
                    Step::Done(()) => self.stage = Stage::Finished,
                },
                Stage::Finished => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardSet, SetShape};

    fn decks(players: usize) -> Vec<Vec<Card>> {
        let set = CardSet::from_records("neo", SetShape::neo_like("neo").records()).expect("set");
        (0..players)
            .map(|p| set.cards()[p * 40..(p + 1) * 40].to_vec())
            .collect()
    }

    #[test]
    fn chooser_is_offered_every_player() {
        let mut opening = Opening::with_seed(decks(3), 17).expect("opening");
        let bundle = opening.resume(Reply::Advance).expect("resume").expect("bundle");
        assert_eq!(bundle.views().len(), 3);
        let choice = bundle.choice().expect("choice");
        assert_eq!(choice.len(), 3);
        assert!(choice.player() < 3);
    }

    #[test]
    fn keep_after_mulligan_bottoms_one_card() {
        let mut opening = Opening::with_seed(decks(2), 3).expect("opening");
        opening.resume(Reply::Advance).expect("starter");
        let announce = opening.resume(Reply::Picked(1)).expect("pick").expect("bundle");
        assert!(matches!(
            announce.views()[0].get(0),
            Some(OpeningView::Starting { player: 1, .. })
        ));

        let hand = opening.resume(Reply::Advance).expect("draw").expect("bundle");
        assert_eq!(hand.choice().map(Choice::player), Some(1));
        assert!(matches!(hand.views()[0].get(1), Some(OpeningView::Hand { cards }) if cards.len() == 7));
        assert!(matches!(hand.views()[0].get(0), Some(OpeningView::HandSize { player: 1, size: 7 })));

        opening.resume(Reply::Picked(1)).expect("mulligan");
        let bottom = opening.resume(Reply::Picked(0)).expect("keep").expect("bundle");
        assert_eq!(bottom.choice().map(Choice::len), Some(7));

        let kept = opening.resume(Reply::Picked(2)).expect("bottom").expect("bundle");
        assert!(matches!(
            kept.views()[0].get(0),
            Some(OpeningView::Kept { player: 1, hand_size: 6 })
        ));
        assert_eq!(opening.mulligans(1), 1);
        assert_eq!(opening.hand(1).len(), 6);
        assert_eq!(opening.library(1).count(), 34);
        assert_eq!(opening.first_player(), Some(1));
    }

    #[test]
    fn small_decks_are_rejected() {
        let mut short = decks(1);
        short[0].truncate(5);
        assert!(matches!(Opening::with_seed(short, 1), Err(ProcessError::Rules(_))));
    }
}
