#![allow(dead_code)]

use std::fs;
use std::sync::atomic::AtomicBool;

use ledger_core::{pow, Block, Transaction};
use ledger_storage::sled_store::SledStore;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// A valid chain of `len` blocks at difficulty 1, `txs_per_block` transactions each.
pub fn mined_chain(len: usize, txs_per_block: usize) -> Vec<Block> {
    let flag = AtomicBool::new(false);
    let mut blocks = vec![Block::genesis()];
    while blocks.len() < len {
        let tip = blocks.last().unwrap();
        let txs = (0..txs_per_block)
            .map(|i| Transaction::new(format!("from-{i}"), format!("to-{i}"), i as u64 + 1).unwrap())
            .collect();
        let candidate = Block::candidate(tip.index + 1, tip.hash.clone(), "miner", txs, 1);
        blocks.push(pow::mine(candidate, 1, &flag).unwrap());
    }
    blocks
}
