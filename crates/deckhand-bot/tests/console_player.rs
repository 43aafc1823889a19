use std::io::Cursor;

use deckhand_bot::{ConsoleStrategy, LinePrompt, StrategyKind};
use deckhand_core::game::{Blackjack, BlackjackOption, BlackjackView};
use deckhand_core::protocol::{
    Choice, Engine, EngineError, Player, PlayerError, Strategy, StrategyError,
};

type Console = ConsoleStrategy<LinePrompt<Cursor<&'static str>, Vec<u8>>>;

fn console(input: &'static str) -> Console {
    ConsoleStrategy::new(LinePrompt::new(Cursor::new(input), Vec::new()))
}

#[test]
fn console_reprompts_until_a_valid_number() {
    let mut player: Player<String, &str> =
        Player::new("human", Box::new(console("zero\n9\n\n2\n")));
    let choice = Choice::new(0, "Pick one", vec!["red", "green"]).expect("choice");
    let decision = player.choice(&choice).expect("eventually valid");
    assert_eq!(decision.index(), 1);
    assert_eq!(*decision.option(), "green");
}

#[test]
fn closed_input_is_reported() {
    let mut strategy = console("nope\n");
    let choice = Choice::new(0, "Pick one", vec!["red"]).expect("choice");
    let err = Strategy::<String, &str>::decide(&mut strategy, &choice, &[]).expect_err("eof");
    assert!(matches!(err, StrategyError::InputClosed));
}

#[test]
fn console_views_are_printed() {
    let mut strategy = console("1\n");
    Strategy::<String, &str>::observe(&mut strategy, &"Dealer shows 10".to_string());
    let choice = Choice::new(0, "Pick one", vec!["red"]).expect("choice");
    Strategy::<String, &str>::decide(&mut strategy, &choice, &[]).expect("answer");

    let (_, written) = strategy.into_prompt().into_inner();
    let text = String::from_utf8(written).expect("utf8");
    assert!(text.starts_with("Dealer shows 10\n"));
    assert!(text.contains("1) red"));
}

#[test]
fn console_player_at_a_blackjack_table() {
    let players: Vec<Player<BlackjackView, BlackjackOption>> = vec![
        Player::new("human", Box::new(console("1\n"))),
        Player::new("bot", StrategyKind::Random.boxed(4)),
    ];
    let mut game = Blackjack::with_seed(2, 21).expect("game");
    let mut engine = Engine::new(players);
    engine.run(&mut game).expect("standing human finishes");
    assert!(game.is_finished());
    assert_eq!(engine.players()[0].decisions(), 1);
}

#[test]
fn console_player_running_out_of_input_stops_the_engine() {
    let players: Vec<Player<BlackjackView, BlackjackOption>> =
        vec![Player::new("human", Box::new(console("")))];
    let mut game = Blackjack::with_seed(1, 3).expect("game");
    let err = Engine::new(players).run(&mut game).expect_err("no input");
    assert!(matches!(
        err,
        EngineError::Player {
            player: 0,
            source: PlayerError::Strategy(StrategyError::InputClosed),
        }
    ));
}
