mod common;

use deckhand_core::booster::SEALED_PACKS;
use deckhand_core::game::deckbuild::MIN_MAIN_DECK;
use deckhand_core::game::{Deck, DeckBuild, LimitedFormat, Opening};
use deckhand_core::protocol::{Engine, EngineError, ProcessError};
use rand::SeedableRng;
use rand::rngs::StdRng;

use common::{first_option_players, neo_box, neo_cache, random_players};

#[test]
fn first_option_builder_finishes_at_minimum_size() {
    let cache = neo_cache();
    let set = cache.library().set("neo").expect("set");
    let mut rng = StdRng::seed_from_u64(10);
    let pool = neo_box(&cache).sealed_pool(SEALED_PACKS, &mut rng);

    let mut build = DeckBuild::new(Deck::from_pool(pool, set.basics()), LimitedFormat::new(set));
    let mut engine = Engine::new(first_option_players(1));
    let summary = engine.run(&mut build).expect("build finishes");

    assert!(build.is_legal());
    assert_eq!(build.deck().main().len(), MIN_MAIN_DECK);
    assert_eq!(build.deck().sideboard().len(), 90 - MIN_MAIN_DECK);
    assert_eq!(summary.choices_answered, MIN_MAIN_DECK + 1);
}

#[test]
fn builder_that_never_finishes_times_out() {
    let cache = neo_cache();
    let set = cache.library().set("neo").expect("set");
    let mut rng = StdRng::seed_from_u64(11);
    let pool = neo_box(&cache).sealed_pool(SEALED_PACKS, &mut rng);

    let mut build = DeckBuild::new(Deck::from_pool(pool, set.basics()), LimitedFormat::new(set))
        .with_max_choices(20);
    let mut engine = Engine::new(first_option_players(1));
    let err = engine.run(&mut build).expect_err("too few choices allowed");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::BuildTimeout { limit: 20 })
    ));
}

#[test]
fn opening_runs_to_completion_for_every_player() {
    let cache = neo_cache();
    let mut rng = StdRng::seed_from_u64(12);
    let boxed = neo_box(&cache);
    let decks: Vec<_> = (0..3)
        .map(|_| boxed.sealed_pool(3, &mut rng))
        .collect();

    let mut opening = Opening::with_seed(decks, 5).expect("opening");
    let mut engine = Engine::new(random_players(3, 8));
    engine.run(&mut opening).expect("opening completes");

    assert!(opening.is_finished());
    let first = opening.first_player().expect("first player chosen");
    assert!(first < 3);
    for player in 0..3 {
        let mulligans = opening.mulligans(player);
        assert_eq!(opening.hand(player).len(), 7 - mulligans.min(7));
        assert_eq!(opening.hand(player).len() + opening.library(player).count(), 45);
    }
}

#[test]
fn random_builder_never_loses_pool_cards() {
    let cache = neo_cache();
    let set = cache.library().set("neo").expect("set");
    let mut rng = StdRng::seed_from_u64(13);
    let pool = neo_box(&cache).sealed_pool(SEALED_PACKS, &mut rng);

    let format = LimitedFormat::new(set.clone()).with_min_main(usize::MAX);
    let mut build = DeckBuild::new(Deck::from_pool(pool, set.basics()), format)
        .with_max_choices(300);
    let mut engine = Engine::new(random_players(1, 14));
    let err = engine.run(&mut build).expect_err("finish is never offered");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::BuildTimeout { limit: 300 })
    ));

    let deck = build.deck();
    let held: Vec<_> = deck.cards().cloned().collect();
    for card in deck.pool() {
        let wanted = deck.pool().iter().filter(|other| *other == card).count();
        let found = held.iter().filter(|other| *other == card).count();
        assert!(found >= wanted, "{} went missing", card.name());
    }
}
