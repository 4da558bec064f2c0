use anyhow::Result as AnyResult;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::block::Block;
use crate::error::{LedgerError, Result};
use crate::validate::{check_block, check_chain, is_valid_chain};

/// Durable home of the full block sequence. Every save overwrites the previous
/// chain wholesale. Lives in `ledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    fn load(&self) -> AnyResult<Option<Vec<Block>>>;
    fn save(&self, blocks: &[Block]) -> AnyResult<()>;
}

/// Keeps the last saved chain in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: Mutex<Option<Vec<Block>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainStore for MemoryStore {
    fn load(&self) -> AnyResult<Option<Vec<Block>>> {
        let guard = self
            .blocks
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, blocks: &[Block]) -> AnyResult<()> {
        let mut guard = self
            .blocks
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *guard = Some(blocks.to_vec());
        Ok(())
    }
}

/// The node's accepted block sequence. Never empty: index 0 is the genesis.
///
/// Mutations write the new chain to the store first and only then swap it in,
/// so a failed save leaves memory exactly as it was.
pub struct Chain<S: ChainStore> {
    store: Arc<S>,
    blocks: Vec<Block>,
}

impl<S: ChainStore> Chain<S> {
    /// Load the persisted chain, or persist a fresh genesis if there is none.
    pub fn open(store: Arc<S>) -> Result<Self> {
        let blocks = match store.load()? {
            Some(blocks) => {
                check_chain(&blocks).map_err(LedgerError::CorruptStore)?;
                info!(height = blocks.len(), "loaded persisted chain");
                blocks
            }
            None => {
                let blocks = vec![Block::genesis()];
                store.save(&blocks)?;
                info!("initialised chain with genesis block");
                blocks
            }
        };
        Ok(Self { store, blocks })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tip(&self) -> &Block {
        // `open` and `replace` only ever install non-empty, validated chains
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains_transaction(&self, id: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| block.transaction_ids().any(|tx_id| tx_id == id))
    }

    /// Extend the chain with `block` if it validates against the current tip.
    pub fn append(&mut self, block: Block) -> Result<()> {
        check_block(&block, self.tip())?;
        let mut next = Vec::with_capacity(self.blocks.len() + 1);
        next.extend_from_slice(&self.blocks);
        next.push(block);
        self.store.save(&next)?;
        self.blocks = next;
        debug!(height = self.blocks.len(), hash = %self.tip().hash, "appended block");
        Ok(())
    }

    /// Longest-valid-chain rule: adopt `remote` only when it is strictly longer
    /// and fully valid. Returns whether the local chain was replaced.
    pub fn replace(&mut self, remote: Vec<Block>) -> Result<bool> {
        if remote.len() <= self.blocks.len() {
            debug!(
                local = self.blocks.len(),
                remote = remote.len(),
                "ignoring chain that is not longer"
            );
            return Ok(false);
        }
        if !is_valid_chain(&remote) {
            debug!(remote = remote.len(), "ignoring invalid chain");
            return Ok(false);
        }
        self.store.save(&remote)?;
        info!(
            from = self.blocks.len(),
            to = remote.len(),
            "replaced local chain"
        );
        self.blocks = remote;
        Ok(true)
    }
}
