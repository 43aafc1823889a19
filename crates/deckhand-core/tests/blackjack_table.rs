mod common;

use deckhand_core::game::blackjack::{BEST_SCORE, DEALER_STANDS_AT};
use deckhand_core::game::{Blackjack, BlackjackOption, BlackjackView, Seat};
use deckhand_core::protocol::{Engine, Message};

use common::{first_option_players, random_players};

fn position_of(history: &[Message<BlackjackView, BlackjackOption>], wanted: &BlackjackView) -> Option<usize> {
    history
        .iter()
        .position(|message| matches!(message, Message::View(view) if view == wanted))
}

fn dealer_reveal(history: &[Message<BlackjackView, BlackjackOption>]) -> usize {
    history
        .iter()
        .position(|message| {
            matches!(
                message,
                Message::View(BlackjackView::Revealed {
                    seat: Seat::Dealer,
                    ..
                })
            )
        })
        .expect("dealer reveal is broadcast")
}

#[test]
fn always_stand_players_never_bust() {
    for players in 1..=4 {
        for seed in 0..10 {
            let mut game = Blackjack::with_seed(players, seed).expect("game");
            let mut engine = Engine::new(first_option_players(players));
            let summary = engine.run(&mut game).expect("run completes");

            assert!(game.is_finished());
            assert_eq!(summary.choices_answered, players);
            for player in 0..players {
                assert!(game.score(Seat::Player(player)) <= BEST_SCORE);
                assert_eq!(game.hand(Seat::Player(player)).len(), 2);
            }
            let dealer = game.score(Seat::Dealer);
            assert!(dealer >= DEALER_STANDS_AT);
        }
    }
}

#[test]
fn random_players_complete_and_busts_precede_dealer_reveal() {
    for players in 1..=4 {
        for seed in 0..10 {
            let mut game = Blackjack::with_seed(players, seed).expect("game");
            let mut engine = Engine::new(random_players(players, seed * 31));
            engine.run(&mut game).expect("run completes");

            let winners = game.winners().expect("winners announced").to_vec();
            for (index, player) in engine.players().iter().enumerate() {
                let seat = Seat::Player(index);
                let history = player.history();
                let reveal = dealer_reveal(history);
                if game.is_busted(seat) {
                    let busted = position_of(history, &BlackjackView::Busted { seat })
                        .expect("bust is broadcast");
                    assert!(busted < reveal);
                    assert!(!winners.contains(&index));
                } else {
                    assert!(game.score(seat) <= BEST_SCORE);
                }
            }
        }
    }
}

#[test]
fn winners_hold_the_best_unbusted_score() {
    for seed in 0..20 {
        let mut game = Blackjack::with_seed(3, seed).expect("game");
        let mut engine = Engine::new(random_players(3, seed));
        engine.run(&mut game).expect("run completes");

        let best = (0..3)
            .map(Seat::Player)
            .chain([Seat::Dealer])
            .filter(|seat| !game.is_busted(*seat))
            .map(|seat| game.score(seat))
            .max();
        for &winner in game.winners().expect("winners") {
            assert_eq!(Some(game.score(Seat::Player(winner))), best);
        }
    }
}

#[test]
fn private_card_only_reaches_its_owner() {
    let mut game = Blackjack::with_seed(3, 77).expect("game");
    let mut engine = Engine::new(first_option_players(3));
    engine.run(&mut game).expect("run completes");

    for (index, player) in engine.players().iter().enumerate() {
        let own = player
            .history()
            .iter()
            .filter(|message| matches!(message, Message::View(BlackjackView::OwnFaceDown { .. })))
            .count();
        assert_eq!(own, 1);

        let hidden_from_me = player
            .history()
            .iter()
            .filter(|message| {
                matches!(
                    message,
                    Message::View(BlackjackView::FaceDown { seat: Seat::Player(p) }) if *p != index
                )
            })
            .count();
        assert_eq!(hidden_from_me, 2);
    }
}

#[test]
fn same_seed_gives_identical_histories() {
    let run = |seed| {
        let mut game = Blackjack::with_seed(4, seed).expect("game");
        let mut engine = Engine::new(random_players(4, 5));
        engine.run(&mut game).expect("run completes");
        engine
            .players()
            .iter()
            .map(|player| serde_json::to_string(player.history()).expect("serialize"))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(12), run(12));
}
