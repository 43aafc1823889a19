use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deckhand_core::booster::{BoosterBox, BoosterCache, SEALED_PACKS};
use deckhand_core::cards::{CardLibrary, SetShape, SyntheticSource};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn neo_box() -> BoosterBox {
    let cache = BoosterCache::new(CardLibrary::new(Box::new(SyntheticSource::new(vec![
        SetShape::neo_like("neo"),
    ]))));
    match cache.composition("neo") {
        Ok(composition) => BoosterBox::new(Arc::clone(&composition)),
        Err(err) => panic!("synthetic set failed to compose: {err}"),
    }
}

fn open_boosters_bench(c: &mut Criterion) {
    let boosters = neo_box();
    let mut group = c.benchmark_group("open_boosters");
    group.bench_function("single_pack", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(boosters.open(&mut rng)))
    });
    group.bench_function("sealed_pool", |b| {
        let mut rng = StdRng::seed_from_u64(11);
        b.iter(|| black_box(boosters.sealed_pool(SEALED_PACKS, &mut rng)))
    });
    group.finish();

    c.bench_function("compose_play_booster", |b| {
        b.iter(|| {
            let cache = BoosterCache::new(CardLibrary::new(Box::new(SyntheticSource::new(vec![
                SetShape::neo_like("neo"),
            ]))));
            black_box(cache.composition("neo").is_ok())
        })
    });
}

criterion_group!(benches, open_boosters_bench);
criterion_main!(benches);
