use criterion::{criterion_group, criterion_main, Criterion};
use hashchain_core::{mine::mine_parallel, pow, BlockCandidate, Chain, Difficulty};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn candidate(rng: &mut StdRng) -> BlockCandidate {
    let data: Vec<u8> = (0..256).map(|_| rng.gen()).collect();
    BlockCandidate::new(1, 1_600_000_000, data)
}

fn bench_pow(c: &mut Criterion) {
    let difficulty = Difficulty::new(4).expect("difficulty in range");
    let mut rng = StdRng::seed_from_u64(42);
    let template = candidate(&mut rng);

    c.bench_function("mine_sequential_difficulty_4", |b| {
        b.iter(|| {
            let mut block = template.clone();
            black_box(pow::mine(&mut block, difficulty, None))
        });
    });

    c.bench_function("mine_parallel_difficulty_4", |b| {
        b.iter(|| {
            let mut block = template.clone();
            black_box(mine_parallel(&mut block, difficulty, None))
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let mut chain = Chain::with_difficulty(Difficulty::new(1).expect("difficulty in range"));
    for i in 0..500u32 {
        chain
            .append_data(format!("block-{i}"))
            .expect("mining succeeds");
    }
    c.bench_function("verify_chain_500", |b| b.iter(|| black_box(chain.is_valid())));
}

criterion_group!(benches, bench_pow, bench_validate);
criterion_main!(benches);
