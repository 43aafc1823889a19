//! Simplified blackjack: every seat plays against the dealer, no bets.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::protocol::{
    Choice, MessageBundle, Process, ProcessError, Reply, Sequence, Step, Views,
};

const CARD_VALUES: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];
pub const DEALER_STANDS_AT: u8 = 17;
pub const BEST_SCORE: u8 = 21;
pub const MAX_SEATS: usize = 7;

type Bundle = MessageBundle<BlackjackView, BlackjackOption>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player(usize),
    Dealer,
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Player(index) => write!(f, "Player {index}"),
            Seat::Dealer => f.write_str("Dealer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum BlackjackView {
    FaceUp { seat: Seat, value: u8 },
    /// Private: only the owner learns the value of their face-down card.
    OwnFaceDown { value: u8 },
    FaceDown { seat: Seat },
    Revealed { seat: Seat, value: u8 },
    Busted { seat: Seat },
    Winners { winners: Vec<usize>, score: Option<u8> },
}

impl fmt::Display for BlackjackView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackjackView::FaceUp { seat, value } => write!(f, "{seat} is dealt {value}"),
            BlackjackView::OwnFaceDown { value } => write!(f, "You are dealt {value} face down"),
            BlackjackView::FaceDown { seat } => write!(f, "{seat} is dealt a face-down card"),
            BlackjackView::Revealed { seat, value } => write!(f, "{seat} reveals {value}"),
            BlackjackView::Busted { seat } => write!(f, "{seat} busts"),
            BlackjackView::Winners { winners, score } => match score {
                Some(score) if !winners.is_empty() => {
                    let names: Vec<String> = winners.iter().map(|p| format!("Player {p}")).collect();
                    write!(f, "Winners with {score}: {}", names.join(", "))
                }
                Some(score) => write!(f, "The dealer wins with {score}"),
                None => f.write_str("Everyone busts"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackOption {
    Stand,
    Hit,
}

impl fmt::Display for BlackjackOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackjackOption::Stand => f.write_str("Stand"),
            BlackjackOption::Hit => f.write_str("Hit"),
        }
    }
}

/// Best total not above 21, counting one ace as 11 when that fits.
pub fn hand_score(cards: &[u8]) -> u8 {
    let total: u8 = cards.iter().sum();
    if cards.contains(&1) && total + 10 <= BEST_SCORE {
        total + 10
    } else {
        total
    }
}

struct Table {
    rng: StdRng,
    hands: Vec<Vec<u8>>,
    dealer: Vec<u8>,
    winners: Option<(Vec<usize>, Option<u8>)>,
}

impl Table {
    fn players(&self) -> usize {
        self.hands.len()
    }

    fn draw(&mut self) -> u8 {
        CARD_VALUES[self.rng.gen_range(0..CARD_VALUES.len())]
    }

    fn deal_to(&mut self, seat: Seat) -> u8 {
        let card = self.draw();
        match seat {
            Seat::Player(index) => self.hands[index].push(card),
            Seat::Dealer => self.dealer.push(card),
        }
        card
    }

    fn hand(&self, seat: Seat) -> &[u8] {
        match seat {
            Seat::Player(index) => match self.hands.get(index) {
                Some(hand) => hand,
                None => &[],
            },
            Seat::Dealer => &self.dealer,
        }
    }

    fn score(&self, seat: Seat) -> u8 {
        hand_score(self.hand(seat))
    }

    fn is_busted(&self, seat: Seat) -> bool {
        self.score(seat) > BEST_SCORE
    }

    fn public(&self, view: BlackjackView) -> Views<BlackjackView> {
        Views::uniform(view, self.players())
    }
}

/// Two cards each: first round face up, second face down.
struct Deal {
    dealt: bool,
}

impl Sequence<Table> for Deal {
    type View = BlackjackView;
    type Opt = BlackjackOption;
    type Output = ();

    fn resume(&mut self, table: &mut Table, reply: Reply) -> Result<Step<Bundle>, ProcessError> {
        reply.advance()?;
        if self.dealt {
            return Ok(Step::Done(()));
        }

        let players = table.players();
        let mut bundle = Bundle::new();
        for seat in (0..players).map(Seat::Player).chain([Seat::Dealer]) {
            let value = table.deal_to(seat);
            bundle.push_views(table.public(BlackjackView::FaceUp { seat, value }));
        }
        for player in 0..players {
            let value = table.deal_to(Seat::Player(player));
            bundle.push_views(Views::from_fn(players, |recipient| {
                if recipient == player {
                    BlackjackView::OwnFaceDown { value }
                } else {
                    BlackjackView::FaceDown {
                        seat: Seat::Player(player),
                    }
                }
            }));
        }
        table.deal_to(Seat::Dealer);
        bundle.push_views(table.public(BlackjackView::FaceDown { seat: Seat::Dealer }));

        self.dealt = true;
        Ok(Step::Yield(bundle))
    }
}

enum TurnPhase {
    Offer,
    Awaiting(Choice<BlackjackOption>),
    Finished,
}

/// One seat hits until it stands or busts.
struct PlayerTurn {
    player: usize,
    phase: TurnPhase,
}

impl PlayerTurn {
    fn new(player: usize) -> Self {
        Self {
            player,
            phase: TurnPhase::Offer,
        }
    }
}

impl Sequence<Table> for PlayerTurn {
    type View = BlackjackView;
    type Opt = BlackjackOption;
    type Output = ();

    fn resume(&mut self, table: &mut Table, reply: Reply) -> Result<Step<Bundle>, ProcessError> {
        let seat = Seat::Player(self.player);
        match std::mem::replace(&mut self.phase, TurnPhase::Finished) {
            TurnPhase::Offer => {
                reply.advance()?;
                if table.is_busted(seat) {
                    return Ok(Step::Done(()));
                }
                let choice = Choice::new(
                    self.player,
                    format!("{seat}: stand on {} or hit?", table.score(seat)),
                    vec![BlackjackOption::Stand, BlackjackOption::Hit],
                )?;
                self.phase = TurnPhase::Awaiting(choice.clone());
                Ok(Step::Yield(Bundle::of_choice(choice)))
            }
            TurnPhase::Awaiting(choice) => {
                let index = reply.pick(&choice)?;
                if choice.option(index) != Some(&BlackjackOption::Hit) {
                    return Ok(Step::Done(()));
                }
                let value = table.deal_to(seat);
                let mut bundle = Bundle::of_views(table.public(BlackjackView::FaceUp { seat, value }));
                if table.is_busted(seat) {
                    bundle.push_views(table.public(BlackjackView::Busted { seat }));
                }
                self.phase = TurnPhase::Offer;
                Ok(Step::Yield(bundle))
            }
            TurnPhase::Finished => Err(ProcessError::rules("player turn resumed after it ended")),
        }
    }
}

/// Every seat's turn in index order.
struct PlayerTurns {
    current: PlayerTurn,
}

impl Sequence<Table> for PlayerTurns {
    type View = BlackjackView;
    type Opt = BlackjackOption;
    type Output = ();

    fn resume(&mut self, table: &mut Table, mut reply: Reply) -> Result<Step<Bundle>, ProcessError> {
        loop {
            crate::yield_from!(self.current.resume(table, reply));
            let next = self.current.player + 1;
            if next >= table.players() {
                return Ok(Step::Done(()));
            }
            self.current = PlayerTurn::new(next);
            reply = Reply::Advance;
        }
    }
}

enum DealerPhase {
    Reveal,
    Drawing,
}

/// Dealer turns the hole card over, then hits below 17.
struct DealerTurn {
    phase: DealerPhase,
}

impl Sequence<Table> for DealerTurn {
    type View = BlackjackView;
    type Opt = BlackjackOption;
    type Output = ();

    fn resume(&mut self, table: &mut Table, reply: Reply) -> Result<Step<Bundle>, ProcessError> {
        reply.advance()?;
        match self.phase {
            DealerPhase::Reveal => {
                let value = table
                    .hand(Seat::Dealer)
                    .get(1)
                    .copied()
                    .ok_or_else(|| ProcessError::rules("dealer has no hole card"))?;
                self.phase = DealerPhase::Drawing;
                Ok(Step::Yield(Bundle::of_views(table.public(
                    BlackjackView::Revealed {
                        seat: Seat::Dealer,
                        value,
                    },
                ))))
            }
            DealerPhase::Drawing => {
                if table.score(Seat::Dealer) >= DEALER_STANDS_AT {
                    return Ok(Step::Done(()));
                }
                let value = table.deal_to(Seat::Dealer);
                let mut bundle = Bundle::of_views(table.public(BlackjackView::FaceUp {
                    seat: Seat::Dealer,
                    value,
                }));
                if table.is_busted(Seat::Dealer) {
                    bundle.push_views(table.public(BlackjackView::Busted { seat: Seat::Dealer }));
                }
                Ok(Step::Yield(bundle))
            }
        }
    }
}

struct ShowWinners {
    shown: bool,
}

impl Sequence<Table> for ShowWinners {
    type View = BlackjackView;
    type Opt = BlackjackOption;
    type Output = ();

    fn resume(&mut self, table: &mut Table, reply: Reply) -> Result<Step<Bundle>, ProcessError> {
        reply.advance()?;
        if self.shown {
            return Ok(Step::Done(()));
        }

        let seats: Vec<Seat> = (0..table.players())
            .map(Seat::Player)
            .chain([Seat::Dealer])
            .collect();
        let best = seats
            .iter()
            .filter(|seat| !table.is_busted(**seat))
            .map(|seat| table.score(*seat))
            .max();
        let winners: Vec<usize> = (0..table.players())
            .filter(|player| {
                let seat = Seat::Player(*player);
                !table.is_busted(seat) && Some(table.score(seat)) == best
            })
            .collect();

        table.winners = Some((winners.clone(), best));
        self.shown = true;
        Ok(Step::Yield(Bundle::of_views(table.public(
            BlackjackView::Winners {
                winners,
                score: best,
            },
        ))))
    }
}

enum Stage {
    Deal(Deal),
    Players(PlayerTurns),
    Dealer(DealerTurn),
    Winners(ShowWinners),
    Finished,
}

/// The blackjack process: deal, each seat's turn, the dealer's turn, winners.
pub struct Blackjack {
    table: Table,
    stage: Stage,
}

impl Blackjack {
    pub fn new(players: usize, rng: StdRng) -> Result<Self, ProcessError> {
        if !(1..=MAX_SEATS).contains(&players) {
            return Err(ProcessError::SeatCount {
                process: "blackjack",
                min: 1,
                max: MAX_SEATS,
                found: players,
            });
        }

        Ok(Self {
            table: Table {
                rng,
                hands: vec![Vec::new(); players],
                dealer: Vec::new(),
                winners: None,
            },
            stage: Stage::Deal(Deal { dealt: false }),
        })
    }

    pub fn with_seed(players: usize, seed: u64) -> Result<Self, ProcessError> {
        Self::new(players, StdRng::seed_from_u64(seed))
    }

    pub fn hand(&self, seat: Seat) -> &[u8] {
        self.table.hand(seat)
    }

    pub fn score(&self, seat: Seat) -> u8 {
        self.table.score(seat)
    }

    pub fn is_busted(&self, seat: Seat) -> bool {
        self.table.is_busted(seat)
    }

    /// Winning seats once the winners have been announced.
    pub fn winners(&self) -> Option<&[usize]> {
        self.table
            .winners
            .as_ref()
            .map(|(winners, _)| winners.as_slice())
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }

    fn advance_stage(&mut self) {
        self.stage = match self.stage {
            Stage::Deal(_) => Stage::Players(PlayerTurns {
                current: PlayerTurn::new(0),
            }),
            Stage::Players(_) => Stage::Dealer(DealerTurn {
                phase: DealerPhase::Reveal,
            }),
            Stage::Dealer(_) => Stage::Winners(ShowWinners { shown: false }),
            Stage::Winners(_) | Stage::Finished => Stage::Finished,
        };
    }
}

impl Process for Blackjack {
    type View = BlackjackView;
    type Opt = BlackjackOption;

    fn num_players(&self) -> usize {
        self.table.players()
    }

    fn resume(&mut self, mut reply: Reply) -> Result<Option<Bundle>, ProcessError> {
        loop {
            let step = match &mut self.stage {
                Stage::Deal(seq) => seq.resume(&mut self.table, reply)?,
                Stage::Players(seq) => seq.resume(&mut self.table, reply)?,
                Stage::Dealer(seq) => seq.resume(&mut self.table, reply)?,
                Stage::Winners(seq) => seq.resume(&mut self.table, reply)?,
                Stage::Finished => return Ok(None),
            };
            match step {
                Step::Yield(bundle) => return Ok(Some(bundle)),
                Step::Done(()) => {
                    self.advance_stage();
                    reply = Reply::Advance;
                }
            }
        }
    }
}
