//! Booster draft: three rounds of fifteen-card packs passed around the table.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::booster::BoosterBox;
use crate::booster::layout::PACK_SIZE;
use crate::cards::Card;
use crate::protocol::{
    Choice, MessageBundle, Process, ProcessError, Reply, Sequence, Step, Views,
};

pub const ROUNDS: usize = 3;
pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 8;

type Bundle = MessageBundle<DraftView, DraftPick>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassDirection {
    Left,
    Right,
}

impl PassDirection {
    /// Left on the first and third rounds, right on the second.
    pub const fn for_round(round: usize) -> Self {
        if round % 2 == 0 {
            PassDirection::Left
        } else {
            PassDirection::Right
        }
    }

    pub const fn target(self, seat: usize, seats: usize) -> usize {
        match self {
            PassDirection::Left => (seat + 1) % seats,
            PassDirection::Right => (seat + seats - 1) % seats,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PassDirection::Left => "left",
            PassDirection::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassRecord {
    pub round: usize,
    pub pick: usize,
    pub direction: PassDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DraftView {
    /// The pack currently in front of the recipient.
    Pack {
        round: usize,
        pick: usize,
        passing: PassDirection,
        cards: Vec<Card>,
    },
    /// The recipient's drafted pool once the draft is over.
    Pool { cards: Vec<Card> },
}

impl fmt::Display for DraftView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftView::Pack {
                round,
                pick,
                passing,
                cards,
            } => write!(
                f,
                "Round {} pick {} (passing {}): {} cards in pack",
                round + 1,
                pick + 1,
                passing.as_str(),
                cards.len()
            ),
            DraftView::Pool { cards } => write!(f, "Drafted pool of {} cards", cards.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DraftPick(pub Card);

impl fmt::Display for DraftPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.0.rarity())
    }
}

struct DraftTable {
    seats: usize,
    boosters: BoosterBox,
    rng: StdRng,
    packs: Vec<Vec<Card>>,
    pools: Vec<Vec<Card>>,
    opened: Vec<Card>,
    passes: Vec<PassRecord>,
    round: usize,
    pick: usize,
}

impl DraftTable {
    fn open_packs(&mut self) -> Result<(), ProcessError> {
        if self.packs.iter().any(|pack| !pack.is_empty()) {
            return Err(ProcessError::rules(format!(
                "round {} opened while packs still hold cards",
                self.round
            )));
        }
        self.packs = self.boosters.open_many(self.seats, &mut self.rng);
        self.opened.extend(self.packs.iter().flatten().cloned());
        self.pick = 0;
        debug!(
            target: "deckhand_core::draft",
            round = self.round,
            seats = self.seats,
            set = self.boosters.set_code(),
            "opened packs"
        );
        Ok(())
    }

    fn pass_packs(&mut self) {
        let direction = PassDirection::for_round(self.round);
        let mut rotated = vec![Vec::new(); self.seats];
        for (seat, pack) in std::mem::take(&mut self.packs).into_iter().enumerate() {
            rotated[direction.target(seat, self.seats)] = pack;
        }
        self.packs = rotated;
        self.passes.push(PassRecord {
            round: self.round,
            pick: self.pick,
            direction,
        });
    }

    fn check_pack_sizes(&self) -> Result<(), ProcessError> {
        let expected = PACK_SIZE - self.pick;
        match self.packs.iter().position(|pack| pack.len() != expected) {
            Some(seat) => Err(ProcessError::rules(format!(
                "seat {seat} holds {} cards at pick {}, expected {expected}",
                self.packs[seat].len(),
                self.pick
            ))),
            None => Ok(()),
        }
    }
}

/// Every seat picks once from the pack in front of it, in seat order.
struct PickRound {
    seat: usize,
    pending: Option<Choice<DraftPick>>,
}

impl PickRound {
    fn new() -> Self {
        Self {
            seat: 0,
            pending: None,
        }
    }
}

impl Sequence<DraftTable> for PickRound {
    type View = DraftView;
    type Opt = DraftPick;
    type Output = ();

    fn resume(
        &mut self,
        table: &mut DraftTable,
        reply: Reply,
    ) -> Result<Step<Bundle>, ProcessError> {
        let mut bundle = Bundle::new();
        match self.pending.take() {
            Some(choice) => {
                let index = reply.pick(&choice)?;
                let pack = &mut table.packs[self.seat];
                if index >= pack.len() {
                    return Err(ProcessError::rules("pick refers to a card no longer in the pack"));
                }
                let card = pack.remove(index);
                table.pools[self.seat].push(card);
                self.seat += 1;
                if self.seat == table.seats {
                    return Ok(Step::Done(()));
                }
            }
            None => {
                reply.advance()?;
                table.check_pack_sizes()?;
                let passing = PassDirection::for_round(table.round);
                bundle.push_views(Views::from_fn(table.seats, |seat| DraftView::Pack {
                    round: table.round,
                    pick: table.pick,
                    passing,
                    cards: table.packs[seat].clone(),
                }));
            }
        }

        let options = table.packs[self.seat]
            .iter()
            .cloned()
            .map(DraftPick)
            .collect();
        let choice = Choice::new(
            self.seat,
            format!(
                "Round {} pick {}: choose a card to keep",
                table.round + 1,
                table.pick + 1
            ),
            options,
        )?;
        self.pending = Some(choice.clone());
        Ok(Step::Yield(bundle.with_choice(choice)))
    }
}

/// Fifteen pick rounds over one set of packs, passing between them.
struct DraftRound {
    picks: PickRound,
}

impl Sequence<DraftTable> for DraftRound {
    type View = DraftView;
    type Opt = DraftPick;
    type Output = ();

    fn resume(
        &mut self,
        table: &mut DraftTable,
        mut reply: Reply,
    ) -> Result<Step<Bundle>, ProcessError> {
        loop {
            crate::yield_from!(self.picks.resume(table, reply));
            table.pick += 1;
            if table.pick == PACK_SIZE {
                if table.packs.iter().any(|pack| !pack.is_empty()) {
                    return Err(ProcessError::rules("packs not empty at end of round"));
                }
                return Ok(Step::Done(()));
            }
            table.pass_packs();
            self.picks = PickRound::new();
            reply = Reply::Advance;
        }
    }
}

enum Stage {
    Start,
    Round(DraftRound),
    Pools,
    Finished,
}

/// The draft process. Seats draft `ROUNDS * PACK_SIZE` cards each.
pub struct Draft {
    table: DraftTable,
    stage: Stage,
}

impl Draft {
    pub fn new(seats: usize, boosters: BoosterBox, rng: StdRng) -> Result<Self, ProcessError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
            return Err(ProcessError::SeatCount {
                process: "draft",
                min: MIN_SEATS,
                max: MAX_SEATS,
                found: seats,
            });
        }

        Ok(Self {
            table: DraftTable {
                seats,
                boosters,
                rng,
                packs: vec![Vec::new(); seats],
                pools: vec![Vec::new(); seats],
                opened: Vec::with_capacity(seats * ROUNDS * PACK_SIZE),
                passes: Vec::new(),
                round: 0,
                pick: 0,
            },
            stage: Stage::Start,
        })
    }

    pub fn with_seed(seats: usize, boosters: BoosterBox, seed: u64) -> Result<Self, ProcessError> {
        Self::new(seats, boosters, StdRng::seed_from_u64(seed))
    }

    pub fn pools(&self) -> &[Vec<Card>] {
        &self.table.pools
    }

    pub fn into_pools(self) -> Vec<Vec<Card>> {
        self.table.pools
    }

    /// Every card opened so far, in opening order.
    pub fn opened(&self) -> &[Card] {
        &self.table.opened
    }

    pub fn passes(&self) -> &[PassRecord] {
        &self.table.passes
    }

    pub fn round(&self) -> usize {
        self.table.round
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }

    fn pools_bundle(&self) -> Bundle {
        Bundle::of_views(Views::from_fn(self.table.seats, |seat| DraftView::Pool {
            cards: self.table.pools[seat].clone(),
        }))
    }
}

impl Process for Draft {
    type View = DraftView;
    type Opt = DraftPick;

    fn num_players(&self) -> usize {
        self.table.seats
    }

    fn resume(&mut self, mut reply: Reply) -> Result<Option<Bundle>, ProcessError> {
        loop {
            match &mut self.stage {
                Stage::Start => {
                    self.table.open_packs()?;
                    self.stage = Stage::Round(DraftRound {
                        picks: PickRound::new(),
                    });
                }
                Stage::Round(round) => match round.resume(&mut self.table, reply)? {
                    Step::Yield(bundle) => return Ok(Some(bundle)),
                    Step::Done(()) => {
                        self.table.round += 1;
                        reply = Reply::Advance;
                        if self.table.round < ROUNDS {
                            self.table.open_packs()?;
                            self.stage = Stage::Round(DraftRound {
                                picks: PickRound::new(),
                            });
                        } else {
                            self.stage = Stage::Pools;
                            return Ok(Some(self.pools_bundle()));
                        }
                    }
                },
                Stage::Pools => {
                    reply.advance()?;
                    self.stage = Stage::Finished;
                }
                Stage::Finished => return Ok(None),
            }
        }
    }
}
