#![allow(dead_code)]

use hashchain_core::{Chain, ChainConfig, Difficulty, MiningStrategy};
use rand::{distributions::Alphanumeric, Rng};

pub fn difficulty(d: u32) -> Difficulty {
    Difficulty::new(d).expect("difficulty in range")
}

pub fn random_payload<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(0..64);
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Chain of `n` mined blocks after genesis, each carrying a random payload.
pub fn build_chain(n: usize, d: u32, strategy: MiningStrategy) -> Chain {
    let mut rng = rand::thread_rng();
    let mut chain = Chain::new(ChainConfig {
        difficulty: difficulty(d),
        strategy,
        ..ChainConfig::default()
    });
    for _ in 0..n {
        let payload = random_payload(&mut rng);
        chain.append_data(payload).expect("mining succeeds");
    }
    chain
}
