#![allow(dead_code, unused_macros)]

/// Re-evaluate `$cond` every 50ms until it holds or five seconds pass.
macro_rules! eventually {
    ($cond:expr) => {{
        let mut held = false;
        for _ in 0..100 {
            if $cond {
                held = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        held
    }};
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledger_core::{pow, Block, Chain, ChainStore, MemoryStore, Transaction};
use ledger_node::{Node, NodeOptions};

/// Extend `blocks` to `len` with difficulty-1 blocks credited to `miner`.
pub fn extend(mut blocks: Vec<Block>, len: usize, miner: &str) -> Vec<Block> {
    let flag = AtomicBool::new(false);
    while blocks.len() < len {
        let tip = blocks.last().expect("chain has a genesis");
        let candidate = Block::candidate(tip.index + 1, tip.hash.clone(), miner, vec![], 1);
        blocks.push(pow::mine(candidate, 1, &flag).expect("difficulty 1 mines"));
    }
    blocks
}

pub fn remote_chain(len: usize, miner: &str) -> Vec<Block> {
    extend(vec![Block::genesis()], len, miner)
}

/// A block on top of `tip` carrying `txs`.
pub fn block_on(tip: &Block, txs: Vec<Transaction>, miner: &str) -> Block {
    let flag = AtomicBool::new(false);
    let candidate = Block::candidate(tip.index + 1, tip.hash.clone(), miner, txs, 1);
    pow::mine(candidate, 1, &flag).expect("difficulty 1 mines")
}

pub fn node_with_len(len: usize) -> Arc<Node<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    store
        .save(&remote_chain(len, "local"))
        .expect("memory store saves");
    let chain = Chain::open(store).expect("chain opens");
    Node::new(chain, NodeOptions::default())
}

/// A store whose saves start failing once `broken` is raised.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub broken: AtomicBool,
}

impl ChainStore for FlakyStore {
    fn load(&self) -> anyhow::Result<Option<Vec<Block>>> {
        self.inner.load()
    }

    fn save(&self, blocks: &[Block]) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.save(blocks)
    }
}

