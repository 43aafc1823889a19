use thiserror::Error;
use tracing::{debug, trace};

use crate::protocol::error::{ProcessError, ProtocolError};
use crate::protocol::message::MessageBundle;
use crate::protocol::player::{Player, PlayerError};
use crate::protocol::process::{Process, Reply};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("process expects {expected} players but {found} are seated")]
    SeatMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("player {player} failed to decide: {source}")]
    Player {
        player: usize,
        #[source]
        source: PlayerError,
    },
    #[error("process failed: {0}")]
    Process(#[from] ProcessError),
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub bundles: usize,
    pub views_delivered: usize,
    pub choices_answered: usize,
}

/// Routes bundles from a process to the seated players and replies back.
pub struct Engine<V, O> {
    players: Vec<Player<V, O>>,
}

impl<V, O> Engine<V, O> {
    pub fn new(players: Vec<Player<V, O>>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player<V, O>] {
        &self.players
    }

    pub fn into_players(self) -> Vec<Player<V, O>> {
        self.players
    }
}

impl<V, O: Clone + PartialEq> Engine<V, O> {
    /// Drives `process` to completion. Any protocol violation, strategy
    /// failure or process error aborts the run.
    pub fn run<P>(&mut self, process: &mut P) -> Result<RunSummary, EngineError>
    where
        P: Process<View = V, Opt = O>,
    {
        let expected = process.num_players();
        if expected != self.players.len() {
            return Err(EngineError::SeatMismatch {
                expected,
                found: self.players.len(),
            });
        }

        let mut summary = RunSummary::default();
        let mut reply = Reply::Advance;
        while let Some(bundle) = process.resume(reply)? {
            summary.bundles += 1;
            reply = self.dispatch(bundle, &mut summary)?;
        }

        debug!(
            target: "deckhand_core::engine",
            players = self.players.len(),
            bundles = summary.bundles,
            views = summary.views_delivered,
            choices = summary.choices_answered,
            "process finished"
        );
        Ok(summary)
    }

    fn dispatch(
        &mut self,
        bundle: MessageBundle<V, O>,
        summary: &mut RunSummary,
    ) -> Result<Reply, EngineError> {
        let players = self.players.len();
        let (rounds, choice) = bundle.into_parts();

        // Nothing is delivered until the whole bundle checks out.
        if let Some(views) = rounds.iter().find(|views| views.len() != players) {
            return Err(ProtocolError::MalformedBundle {
                expected: players,
                found: views.len(),
            }
            .into());
        }
        if let Some(seat) = choice
            .as_ref()
            .map(|choice| choice.player())
            .filter(|&seat| seat >= players)
        {
            return Err(ProtocolError::InvalidPlayer {
                player: seat,
                players,
            }
            .into());
        }

        for views in rounds {
            for (player, view) in self.players.iter_mut().zip(views.into_inner()) {
                player.view(view);
                summary.views_delivered += 1;
            }
        }

        let Some(choice) = choice else {
            return Ok(Reply::Advance);
        };

        let seat = choice.player();
        let player = self
            .players
            .get_mut(seat)
            .ok_or(ProtocolError::InvalidPlayer {
                player: seat,
                players,
            })?;

        let decision = player
            .choice(&choice)
            .map_err(|source| EngineError::Player {
                player: seat,
                source,
            })?;
        choice.validate_decision(&decision)?;
        summary.choices_answered += 1;

        trace!(
            target: "deckhand_core::engine",
            player = seat,
            choice = choice.description(),
            index = decision.index(),
            "decision accepted"
        );
        Ok(Reply::Picked(decision.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::error::DecisionFault;
    use crate::protocol::message::{Choice, Message, Views};
    use crate::protocol::player::{Strategy, StrategyError};

    struct First;

    impl Strategy<u8, u8> for First {
        fn decide(
            &mut self,
            _choice: &Choice<u8>,
            _history: &[Message<u8, u8>],
        ) -> Result<usize, StrategyError> {
            Ok(0)
        }
    }

    struct Wild;

    impl Strategy<u8, u8> for Wild {
        fn decide(
            &mut self,
            choice: &Choice<u8>,
            _history: &[Message<u8, u8>],
        ) -> Result<usize, StrategyError> {
            Ok(choice.len())
        }
    }

    /// Yields a scripted list of bundles and records what it was resumed with.
    struct Scripted {
        players: usize,
        script: Vec<MessageBundle<u8, u8>>,
        replies: Vec<Reply>,
    }

    impl Process for Scripted {
        type View = u8;
        type Opt = u8;

        fn num_players(&self) -> usize {
            self.players
        }

        fn resume(&mut self, reply: Reply) -> Result<Option<MessageBundle<u8, u8>>, ProcessError> {
            self.replies.push(reply);
            if self.script.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.script.remove(0)))
        }
    }

    fn seat(count: usize) -> Vec<Player<u8, u8>> {
        (0..count)
            .map(|i| Player::new(format!("p{i}"), Box::new(First) as Box<dyn Strategy<u8, u8>>))
            .collect()
    }

    #[test]
    fn routes_views_and_choice_then_resumes_with_pick() {
        let choice = Choice::new(1, "number", vec![10, 20]).expect("choice");
        let mut process = Scripted {
            players: 2,
            script: vec![
                MessageBundle::of_views(Views::new(vec![1, 2])).with_choice(choice),
                MessageBundle::of_views(Views::uniform(7, 2)),
            ],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(2));
        let summary = engine.run(&mut process).expect("run");

        assert_eq!(summary.bundles, 2);
        assert_eq!(summary.views_delivered, 4);
        assert_eq!(summary.choices_answered, 1);
        assert_eq!(
            process.replies,
            vec![Reply::Advance, Reply::Picked(0), Reply::Advance]
        );
        assert_eq!(engine.players()[0].history().len(), 2);
        assert_eq!(engine.players()[1].history().len(), 4);
    }

    #[test]
    fn short_views_are_malformed() {
        let mut process = Scripted {
            players: 3,
            script: vec![MessageBundle::of_views(Views::new(vec![1, 2]))],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(3));
        let err = engine.run(&mut process).expect_err("malformed");
        assert!(matches!(
            err,
            EngineError::Protocol(ProtocolError::MalformedBundle {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn malformed_later_round_delivers_nothing() {
        let bundle = MessageBundle::of_views(Views::new(vec![1, 2])).with_views(Views::new(vec![3]));
        let mut process = Scripted {
            players: 2,
            script: vec![bundle],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(2));
        let err = engine.run(&mut process).expect_err("malformed");
        assert!(matches!(
            err,
            EngineError::Protocol(ProtocolError::MalformedBundle {
                expected: 2,
                found: 1
            })
        ));
        assert!(engine.players().iter().all(|player| player.history().is_empty()));
    }

    #[test]
    fn views_are_withheld_when_choice_targets_missing_seat() {
        let choice = Choice::new(5, "number", vec![1, 2]).expect("choice");
        let mut process = Scripted {
            players: 2,
            script: vec![MessageBundle::of_views(Views::uniform(9, 2)).with_choice(choice)],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(2));
        assert!(matches!(
            engine.run(&mut process),
            Err(EngineError::Protocol(ProtocolError::InvalidPlayer { player: 5, .. }))
        ));
        assert!(engine.players().iter().all(|player| player.history().is_empty()));
    }

    #[test]
    fn choice_for_missing_seat_is_rejected() {
        let choice = Choice::new(4, "number", vec![1]).expect("choice");
        let mut process = Scripted {
            players: 2,
            script: vec![MessageBundle::of_choice(choice)],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(2));
        let err = engine.run(&mut process).expect_err("invalid player");
        assert!(matches!(
            err,
            EngineError::Protocol(ProtocolError::InvalidPlayer {
                player: 4,
                players: 2
            })
        ));
    }

    #[test]
    fn strategy_out_of_range_aborts_run() {
        let choice = Choice::new(0, "number", vec![1, 2]).expect("choice");
        let mut process = Scripted {
            players: 1,
            script: vec![MessageBundle::of_choice(choice)],
            replies: Vec::new(),
        };
        let mut engine = Engine::new(vec![Player::new(
            "wild",
            Box::new(Wild) as Box<dyn Strategy<u8, u8>>,
        )]);
        let err = engine.run(&mut process).expect_err("invalid decision");
        assert!(matches!(
            err,
            EngineError::Player {
                player: 0,
                source: PlayerError::Protocol(ProtocolError::InvalidDecision {
                    fault: DecisionFault::OutOfRange { options: 2 },
                    ..
                }),
            }
        ));
    }

    #[test]
    fn roster_size_must_match_process() {
        let mut process = Scripted {
            players: 3,
            script: Vec::new(),
            replies: Vec::new(),
        };
        let mut engine = Engine::new(seat(2));
        assert!(matches!(
            engine.run(&mut process),
            Err(EngineError::SeatMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
