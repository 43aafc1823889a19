mod agents;
mod rotation;

use std::cell::RefCell;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use deckhand_core::booster::{BoosterBox, BoosterCache, BoosterError, SEALED_PACKS};
use deckhand_core::cards::{
    Card, CardDataError, CardDisplay, CardLibrary, CardSet, NullDisplay, Rarity, SetShape,
    SyntheticSource,
};
use deckhand_core::game::{Blackjack, Deck, DeckBuild, Draft, LimitedFormat, Opening, Seat};
use deckhand_core::protocol::{Engine, EngineError, Player, ProcessError, Strategy};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, debug, event, warn};

use crate::config::{CardSourceKind, ResolvedOutputs, SessionKind, SimulationConfig};
use crate::report::{ReportCollector, ReportError};

pub use agents::{AgentError, DecisionSummary};
pub use rotation::SeatRotation;

use agents::{AgentBlueprint, DecisionMetrics};

const TABLE_SALT: u64 = 0x9E37_79B9_7F4A_7C15;
const BUILD_SALT: u64 = 0xD1B5_4A32_D192_ED03;

/// Plays the configured sessions and writes one JSONL row per seat.
pub struct SessionRunner {
    config: SimulationConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    rotation: SeatRotation,
    cards: Option<SessionCards>,
    display: Box<dyn CardDisplay>,
}

/// Booster box and format set shared by every session of a run.
struct SessionCards {
    boosters: BoosterBox,
    set: Arc<CardSet>,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub sessions_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl SessionRunner {
    /// Build a runner from a validated configuration. Card data is loaded and
    /// the booster composition built up front.
    pub fn new(config: SimulationConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        let (min, max) = config.session.kind.seats();
        if !(min..=max).contains(&agents.len()) {
            return Err(RunnerError::SeatCount {
                kind: config.session.kind.as_str(),
                min,
                max,
                found: agents.len(),
            });
        }

        let cards = if config.session.kind.uses_cards() {
            Some(load_cards(&config)?)
        } else {
            None
        };

        Ok(Self {
            rotation: SeatRotation::new(agents.len()),
            config,
            outputs,
            agents,
            cards,
            display: Box::new(NullDisplay),
        })
    }

    /// Renders every built deck (or opening pool) through `display`.
    pub fn with_display(mut self, display: Box<dyn CardDisplay>) -> Self {
        self.display = display;
        self
    }

    /// Execute every session, streaming JSONL rows to disk.
    pub fn run(&mut self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.session.seed.unwrap_or(0));
        let mut report = ReportCollector::new(&self.config);
        let mut rows_written = 0usize;

        for session_index in 0..self.config.session.count {
            let session_seed = rng.next_u64();
            let seating = self.rotation.seating(session_index);
            let outcome = self.play_session(session_index, session_seed, &seating)?;
            report.record_session(&outcome)?;
            rows_written += write_session_rows(
                &mut writer,
                &self.config,
                session_index,
                session_seed,
                &outcome,
            )?;
        }

        writer.flush()?;
        report.finalize().write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            sessions_played: self.config.session.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }

    fn play_session(
        &mut self,
        session_index: usize,
        session_seed: u64,
        seating: &[usize],
    ) -> Result<SessionOutcome, RunnerError> {
        let seats = seating
            .iter()
            .enumerate()
            .map(|(seat, &agent)| {
                self.agents
                    .get(agent)
                    .map(|_| SeatState::new(seat, agent))
                    .ok_or(RunnerError::InvalidSeating { seat, agent })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            target: "deckhand_bench::session",
            run_id = %self.config.run_id,
            session = session_index,
            seed = session_seed,
            kind = self.config.session.kind.as_str(),
            "starting session"
        );

        let results = match self.config.session.kind {
            SessionKind::Blackjack => self.play_blackjack(session_seed, &seats)?,
            SessionKind::Draft => self.play_draft(session_seed, &seats)?,
            SessionKind::Sealed => self.play_sealed(session_seed, &seats)?,
            SessionKind::Opening => self.play_opening(session_seed, &seats)?,
        };

        let seat_results: Vec<SeatResult> = seats
            .into_iter()
            .zip(results)
            .map(|(state, (score, won, detail))| SeatResult {
                agent_name: self.agents[state.agent].name.clone(),
                seat: state.seat,
                score,
                won,
                metrics: state.metrics.borrow().finalize(),
                detail,
            })
            .collect();

        if tracing::enabled!(Level::INFO) {
            for result in &seat_results {
                event!(
                    target: "deckhand_bench::seat",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    session = session_index,
                    seat = result.seat,
                    agent = %result.agent_name,
                    score = result.score,
                    won = result.won,
                    decisions = result.metrics.decisions,
                    elapsed_ms = result.metrics.total_ms
                );
            }
        }

        Ok(SessionOutcome {
            kind: self.config.session.kind,
            seating: seating
                .iter()
                .map(|&agent| self.agents[agent].name.clone())
                .collect(),
            seat_results,
        })
    }

    fn players<V, O>(&self, seats: &[SeatState], seed: u64, salt: u64) -> Vec<Player<V, O>>
    where
        V: Display + 'static,
        O: Display + 'static,
    {
        seats
            .iter()
            .map(|state| self.player(state, seed, salt))
            .collect()
    }

    fn player<V, O>(&self, state: &SeatState, seed: u64, salt: u64) -> Player<V, O>
    where
        V: Display + 'static,
        O: Display + 'static,
    {
        let agent = &self.agents[state.agent];
        let seat_seed = seed ^ (state.seat as u64 + 1).wrapping_mul(salt);
        let strategy: Box<dyn Strategy<V, O>> = agent.spawn(seat_seed, &state.metrics);
        Player::new(agent.name.clone(), strategy)
    }

    fn session_cards(&self) -> Result<&SessionCards, RunnerError> {
        self.cards.as_ref().ok_or(RunnerError::MissingCards {
            kind: self.config.session.kind.as_str(),
        })
    }

    fn play_blackjack(&self, seed: u64, seats: &[SeatState]) -> Result<Vec<SeatOutcome>, RunnerError> {
        let mut game = Blackjack::new(seats.len(), StdRng::seed_from_u64(seed))?;
        let mut engine = Engine::new(self.players(seats, seed, TABLE_SALT));
        engine.run(&mut game)?;

        let winners = game.winners().unwrap_or(&[]);
        let dealer = game.score(Seat::Dealer);
        Ok(seats
            .iter()
            .map(|state| {
                let seat = Seat::Player(state.seat);
                let busted = game.is_busted(seat);
                let score = if busted { 0.0 } else { f64::from(game.score(seat)) };
                let detail = SeatDetail::Blackjack {
                    hand: game.hand(seat).to_vec(),
                    busted,
                    dealer,
                };
                (score, winners.contains(&state.seat), detail)
            })
            .collect())
    }

    fn play_draft(&mut self, seed: u64, seats: &[SeatState]) -> Result<Vec<SeatOutcome>, RunnerError> {
        let boosters = self.session_cards()?.boosters.clone();
        let pools = {
            let mut draft = Draft::new(seats.len(), boosters, StdRng::seed_from_u64(seed))?;
            let mut engine = Engine::new(self.players(seats, seed, TABLE_SALT));
            engine.run(&mut draft)?;
            draft.into_pools()
        };
        self.build_decks(seed, seats, pools)
    }

    fn play_sealed(&mut self, seed: u64, seats: &[SeatState]) -> Result<Vec<SeatOutcome>, RunnerError> {
        let cards = self.session_cards()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let pools = seats
            .iter()
            .map(|_| cards.boosters.sealed_pool(SEALED_PACKS, &mut rng))
            .collect();
        self.build_decks(seed, seats, pools)
    }

    /// Each seat builds from its own pool; the best main deck value wins.
    fn build_decks(
        &mut self,
        seed: u64,
        seats: &[SeatState],
        pools: Vec<Vec<Card>>,
    ) -> Result<Vec<SeatOutcome>, RunnerError> {
        let set = Arc::clone(&self.session_cards()?.set);
        let mut built = Vec::with_capacity(seats.len());

        for (state, pool) in seats.iter().zip(pools) {
            let pool_size = pool.len();
            let pool_value = rarity_value(&pool);
            let mut build = DeckBuild::new(
                Deck::from_pool(pool, set.basics()),
                LimitedFormat::new(Arc::clone(&set)),
            )
            .with_max_choices(self.config.session.max_build_choices);

            let timed_out = {
                let mut engine = Engine::new(vec![self.player(state, seed, BUILD_SALT)]);
                match engine.run(&mut build) {
                    Ok(_) => false,
                    Err(EngineError::Process(ProcessError::BuildTimeout { limit })) => {
                        warn!(
                            target: "deckhand_bench::session",
                            seat = state.seat,
                            agent = %self.agents[state.agent].name,
                            limit,
                            "deck build ran out of choices"
                        );
                        true
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            let legal = !timed_out && build.is_legal();
            let deck = build.deck();
            let title = format!("{} (seat {})", self.agents[state.agent].name, state.seat);
            self.display.display_cards(&title, deck.main())?;

            let score = if legal { rarity_value(deck.main()) } else { 0.0 };
            built.push((
                score,
                SeatDetail::Limited {
                    pool: pool_size,
                    pool_value,
                    main_deck: deck.main().len(),
                    legal,
                    timed_out,
                },
            ));
        }

        let best = built
            .iter()
            .map(|(score, _)| *score)
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(built
            .into_iter()
            .map(|(score, detail)| (score, score > 0.0 && score == best, detail))
            .collect())
    }

    fn play_opening(&mut self, seed: u64, seats: &[SeatState]) -> Result<Vec<SeatOutcome>, RunnerError> {
        let cards = self.session_cards()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let decks: Vec<Vec<Card>> = seats
            .iter()
            .map(|_| cards.boosters.sealed_pool(SEALED_PACKS, &mut rng))
            .collect();

        let mut opening = Opening::new(decks, StdRng::seed_from_u64(rng.next_u64()))?;
        {
            let mut engine = Engine::new(self.players(seats, seed, TABLE_SALT));
            engine.run(&mut opening)?;
        }

        let first = opening.first_player();
        let mut outcomes = Vec::with_capacity(seats.len());
        for state in seats {
            let hand = opening.hand(state.seat);
            let title = format!("{} opening hand", self.agents[state.agent].name);
            self.display.display_cards(&title, hand)?;
            outcomes.push((
                hand.len() as f64,
                first == Some(state.seat),
                SeatDetail::Opening {
                    hand: hand.len(),
                    mulligans: opening.mulligans(state.seat),
                    first_player: first == Some(state.seat),
                },
            ));
        }
        Ok(outcomes)
    }
}

fn load_cards(config: &SimulationConfig) -> Result<SessionCards, RunnerError> {
    let code = config.session.set.as_str();
    let library = match (config.cards.source, config.cards.dir.as_ref()) {
        (CardSourceKind::Json, Some(dir)) => CardLibrary::from_json_dir(dir),
        (CardSourceKind::Json, None) => {
            return Err(RunnerError::MissingCards {
                kind: config.session.kind.as_str(),
            });
        }
        (CardSourceKind::Synthetic, _) => CardLibrary::new(Box::new(SyntheticSource::new(vec![
            SetShape::neo_like(code),
        ]))),
    };
    let cache = BoosterCache::new(library);
    let composition = cache.composition(code)?;
    let set = cache.library().set(code)?;
    Ok(SessionCards {
        boosters: BoosterBox::new(composition),
        set,
    })
}

/// Common 1, uncommon 2, rare 3, mythic 4; lands and specials count nothing.
fn rarity_value(cards: &[Card]) -> f64 {
    cards
        .iter()
        .filter(|card| !card.is_land())
        .map(|card| match card.rarity() {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 2.0,
            Rarity::Rare => 3.0,
            Rarity::Mythic => 4.0,
            Rarity::Special | Rarity::Bonus => 0.0,
        })
        .sum()
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_session_rows(
    writer: &mut BufWriter<File>,
    config: &SimulationConfig,
    session_index: usize,
    session_seed: u64,
    outcome: &SessionOutcome,
) -> Result<usize, RunnerError> {
    let session_id = format!("S{session_index:05}");

    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let row = SessionLogRow {
            run_id: &config.run_id,
            session_id: &session_id,
            session_index,
            session_seed,
            kind: outcome.kind,
            seat: seat_result.seat,
            agent: &seat_result.agent_name,
            seating: &outcome.seating,
            score: seat_result.score,
            won: seat_result.won,
            decisions: seat_result.metrics.decisions,
            ms_per_decision: seat_result.metrics.avg_ms_per_decision,
            detail: &seat_result.detail,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

struct SeatState {
    seat: usize,
    agent: usize,
    metrics: Rc<RefCell<DecisionMetrics>>,
}

impl SeatState {
    fn new(seat: usize, agent: usize) -> Self {
        Self {
            seat,
            agent,
            metrics: Rc::new(RefCell::new(DecisionMetrics::default())),
        }
    }
}

type SeatOutcome = (f64, bool, SeatDetail);

pub struct SessionOutcome {
    pub kind: SessionKind,
    pub seating: Vec<String>,
    pub seat_results: Vec<SeatResult>,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: usize,
    pub score: f64,
    pub won: bool,
    pub metrics: DecisionSummary,
    pub detail: SeatDetail,
}

/// Kind-specific outcome attached to each row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatDetail {
    Blackjack {
        hand: Vec<u8>,
        busted: bool,
        dealer: u8,
    },
    Limited {
        pool: usize,
        pool_value: f64,
        main_deck: usize,
        legal: bool,
        timed_out: bool,
    },
    Opening {
        hand: usize,
        mulligans: usize,
        first_player: bool,
    },
}

#[derive(Serialize)]
struct SessionLogRow<'a> {
    run_id: &'a str,
    session_id: &'a str,
    session_index: usize,
    session_seed: u64,
    kind: SessionKind,
    seat: usize,
    agent: &'a str,
    seating: &'a [String],
    score: f64,
    won: bool,
    decisions: u32,
    ms_per_decision: f64,
    detail: &'a SeatDetail,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("session failed: {0}")]
    Engine(#[from] EngineError),
    #[error("session could not start: {0}")]
    Process(#[from] ProcessError),
    #[error("card data unavailable: {0}")]
    Cards(#[from] CardDataError),
    #[error("booster composition failed: {0}")]
    Booster(#[from] BoosterError),
    #[error("{kind} sessions seat {min} to {max} agents but found {found}")]
    SeatCount {
        kind: &'static str,
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("seat {seat} references invalid agent index {agent}")]
    InvalidSeating { seat: usize, agent: usize },
    #[error("{kind} sessions need card data")]
    MissingCards { kind: &'static str },
    #[error("report error: {0}")]
    Report(#[from] ReportError),
}
