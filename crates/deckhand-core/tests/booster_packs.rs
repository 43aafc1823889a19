mod common;

use std::collections::HashSet;
use std::sync::Arc;

use deckhand_core::booster::{BoosterBox, SEALED_PACKS};
use deckhand_core::cards::Card;
use rand::SeedableRng;
use rand::rngs::StdRng;

use common::{neo_box, neo_cache};

fn open(boxed: &BoosterBox, seed: u64, count: usize) -> Vec<Vec<Card>> {
    let mut rng = StdRng::seed_from_u64(seed);
    boxed.open_many(count, &mut rng)
}

#[test]
fn thousand_packs_reach_every_card() {
    let cache = neo_cache();
    let boxed = neo_box(&cache);
    let packs = open(&boxed, 2024, 1_000);

    let mut seen: Vec<Card> = Vec::new();
    for pack in &packs {
        assert_eq!(pack.len(), 15);
        for (index, card) in pack.iter().enumerate() {
            assert!(
                pack[index + 1..].iter().all(|other| !other.same(card)),
                "duplicate {card:?} in pack"
            );
            if !seen.iter().any(|known| known.same(card)) {
                seen.push(card.clone());
            }
        }
    }
    assert_eq!(seen.len(), 302);

    let keys: HashSet<&Card> = seen.iter().collect();
    assert_eq!(keys.len(), 302);
}

#[test]
fn same_seed_draws_the_same_handles() {
    let cache = neo_cache();
    let boxed = neo_box(&cache);
    let first = open(&boxed, 5, 50);
    let second = open(&boxed, 5, 50);
    for (a, b) in first.iter().flatten().zip(second.iter().flatten()) {
        assert!(a.same(b));
    }
    assert_ne!(first, open(&boxed, 6, 50));
}

#[test]
fn composition_is_shared_between_boxes() {
    let cache = neo_cache();
    let a = cache.composition("neo").expect("composition");
    let b = cache.composition("neo").expect("composition");
    assert!(Arc::ptr_eq(&a, &b));

    let mut rng = StdRng::seed_from_u64(8);
    let pool = BoosterBox::new(a).sealed_pool(SEALED_PACKS, &mut rng);
    assert_eq!(pool.len(), 90);
}
