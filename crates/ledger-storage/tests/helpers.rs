#![allow(dead_code)]

use std::time::Duration;

use ledger_core::{Chain, ManualClock, Miner, MinerConfig};
use ledger_storage::JsonFileStore;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, JsonFileStore) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = JsonFileStore::new(temp_dir.path().join("blockchain.json"));
    (temp_dir, store)
}

pub fn test_miner() -> Miner<ManualClock> {
    let config = MinerConfig {
        initial_difficulty: 1,
        ..MinerConfig::default()
    };
    let clock = ManualClock::new(Duration::from_secs(1_700_000_000), Duration::from_secs(1));
    Miner::with_clock(config, clock)
}

pub fn chain_with(payloads: &[&str]) -> Chain<ManualClock> {
    let mut chain = Chain::with_miner(test_miner());
    for payload in payloads {
        chain.add_block(*payload).expect("chain has a head");
    }
    chain
}
