use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledger_core::difficulty::next_difficulty;
use ledger_core::{pow, Block, Chain, ChainStore, LedgerError, Message, Transaction, TxPool};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::gossip::{PeerHandle, PeerSet};

#[derive(Clone, Copy, Debug, Default)]
pub struct NodeOptions {
    /// Search nonces on the rayon pool instead of a single thread.
    pub parallel_mining: bool,
}

/// Everything that must change together: chain, pool and the flags of the
/// proof-of-work searches currently building on the tip.
struct Ledger<S: ChainStore> {
    chain: Chain<S>,
    pool: TxPool,
    miners: Vec<Arc<AtomicBool>>,
}

impl<S: ChainStore> Ledger<S> {
    /// The tip moved: every in-flight search is now building on a stale block.
    fn supersede_miners(&mut self) {
        for flag in self.miners.drain(..) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    fn forget_miner(&mut self, flag: &Arc<AtomicBool>) {
        self.miners.retain(|f| !Arc::ptr_eq(f, flag));
    }

    fn confirmed_ids(&self) -> HashSet<String> {
        self.chain
            .blocks()
            .iter()
            .flat_map(|b| b.transaction_ids().map(str::to_owned))
            .collect()
    }

    /// Put drafted transactions back unless the current chain already holds them.
    fn requeue(&mut self, drafted: Vec<Transaction>) {
        let confirmed = self.confirmed_ids();
        for tx in drafted {
            if !confirmed.contains(&tx.id) {
                self.pool.add(tx);
            }
        }
    }
}

/// The single owner of a node's chain and pool.
///
/// Every read-modify-write of ledger state happens under one async mutex.
/// Proof-of-work runs outside it, so gossip keeps flowing while a search runs.
pub struct Node<S: ChainStore> {
    ledger: Mutex<Ledger<S>>,
    peers: PeerSet,
    options: NodeOptions,
}

impl<S: ChainStore + 'static> Node<S> {
    pub fn new(chain: Chain<S>, options: NodeOptions) -> Arc<Self> {
        Arc::new(Self {
            ledger: Mutex::new(Ledger {
                chain,
                pool: TxPool::new(),
                miners: Vec::new(),
            }),
            peers: PeerSet::new(),
            options,
        })
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    /// Queue our chain for a new peer and add it to the broadcast set while the
    /// ledger is locked, so every block is either in that snapshot or announced
    /// to the peer afterwards.
    pub async fn register_peer(
        &self,
        address: SocketAddr,
        sender: mpsc::Sender<Message>,
    ) -> Result<PeerHandle, LedgerError> {
        let ledger = self.ledger.lock().await;
        sender
            .try_send(Message::Chain(ledger.chain.blocks().to_vec()))
            .map_err(|e| LedgerError::Internal(format!("peer queue unavailable: {e}")))?;
        let handle = self.peers.insert(address, sender).await;
        drop(ledger);
        debug!(%address, id = handle.id, "peer registered");
        Ok(handle)
    }

    pub async fn chain(&self) -> Vec<Block> {
        self.ledger.lock().await.chain.blocks().to_vec()
    }

    pub async fn tip(&self) -> Block {
        self.ledger.lock().await.chain.tip().clone()
    }

    pub async fn pending(&self) -> Vec<Transaction> {
        self.ledger.lock().await.pool.pending().to_vec()
    }

    /// Mine the pooled transactions into a new block credited to `miner`,
    /// append it, persist it and announce it to every peer.
    pub async fn mine(&self, miner: &str) -> Result<Block, LedgerError> {
        if miner.trim().is_empty() {
            return Err(LedgerError::InvalidMiner(miner.to_string()));
        }

        let flag = Arc::new(AtomicBool::new(false));
        let (candidate, difficulty) = {
            let mut guard = self.ledger.lock().await;
            let ledger = &mut *guard;
            let txs = ledger.pool.drain();
            let tip = ledger.chain.tip();
            let difficulty = next_difficulty(tip);
            let candidate = Block::candidate(tip.index + 1, tip.hash.clone(), miner, txs, difficulty);
            ledger.miners.push(Arc::clone(&flag));
            (candidate, difficulty)
        };
        info!(
            index = candidate.index,
            difficulty,
            txs = candidate.transactions.len(),
            "mining started"
        );

        let drafted = candidate.transactions.clone();
        let parallel = self.options.parallel_mining;
        let search_flag = Arc::clone(&flag);
        let searched = tokio::task::spawn_blocking(move || {
            if parallel {
                pow::mine_parallel(candidate, difficulty, &search_flag)
            } else {
                pow::mine(candidate, difficulty, &search_flag)
            }
        })
        .await
        .unwrap_or_else(|e| Err(LedgerError::Internal(format!("mining task failed: {e}"))));

        let mut guard = self.ledger.lock().await;
        let ledger = &mut *guard;
        ledger.forget_miner(&flag);
        let committed = searched.and_then(|block| {
            ledger.chain.append(block.clone())?;
            Ok(block)
        });

        match committed {
            Ok(block) => {
                // drop any echo of our own transactions that arrived mid-search
                ledger.pool.remove(block.transaction_ids());
                ledger.supersede_miners();
                drop(guard);
                info!(index = block.index, hash = %block.hash, "mined block appended");
                self.peers.broadcast(&Message::Block(block.clone())).await;
                Ok(block)
            }
            Err(e) => {
                ledger.requeue(drafted);
                warn!(error = %e, "mining did not produce a block");
                Err(e)
            }
        }
    }

    /// Enqueue a new transaction and gossip it.
    pub async fn submit_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        let tx = Transaction::new(from, to, amount)?;
        self.ledger.lock().await.pool.add(tx.clone());
        debug!(id = %tx.id, "transaction submitted");
        self.peers.broadcast(&Message::Transaction(tx.clone())).await;
        Ok(tx)
    }

    /// Route one inbound gossip message. Invalid content is dropped quietly.
    pub async fn receive(&self, message: Message) {
        let kind = message.kind();
        let outcome = match message {
            Message::Transaction(tx) => self.receive_transaction(tx).await.map(|_| ()),
            Message::Block(block) => self.receive_block(block).await,
            Message::Chain(blocks) => self.receive_chain(blocks).await.map(|_| ()),
        };
        match outcome {
            Ok(()) => {}
            Err(LedgerError::Persistence(e)) => error!(kind, "failed to persist gossip: {e:#}"),
            Err(e) => debug!(kind, error = %e, "discarded gossip"),
        }
    }

    /// Pool a peer's transaction unless it is already pooled or confirmed.
    /// Returns whether it was new.
    pub async fn receive_transaction(&self, tx: Transaction) -> Result<bool, LedgerError> {
        tx.validate()?;
        {
            let mut ledger = self.ledger.lock().await;
            if ledger.pool.contains(&tx.id) || ledger.chain.contains_transaction(&tx.id) {
                return Ok(false);
            }
            ledger.pool.add(tx.clone());
        }
        debug!(id = %tx.id, "transaction accepted from peer");
        self.peers.broadcast(&Message::Transaction(tx)).await;
        Ok(true)
    }

    /// Append a peer's block if it extends our tip, then pass it on.
    pub async fn receive_block(&self, block: Block) -> Result<(), LedgerError> {
        {
            let mut guard = self.ledger.lock().await;
            let ledger = &mut *guard;
            ledger.chain.append(block.clone())?;
            let evicted = ledger.pool.remove(block.transaction_ids());
            ledger.supersede_miners();
            info!(index = block.index, hash = %block.hash, evicted, "block accepted from peer");
        }
        self.peers.broadcast(&Message::Block(block)).await;
        Ok(())
    }

    /// Adopt a peer's chain under the longest-valid-chain rule.
    /// Returns whether the local chain was replaced.
    pub async fn receive_chain(&self, blocks: Vec<Block>) -> Result<bool, LedgerError> {
        {
            let mut guard = self.ledger.lock().await;
            let ledger = &mut *guard;
            if !ledger.chain.replace(blocks.clone())? {
                return Ok(false);
            }
            let confirmed = ledger.confirmed_ids();
            let evicted = ledger.pool.remove(confirmed.iter().map(String::as_str));
            ledger.supersede_miners();
            debug!(evicted, "pool pruned after chain replacement");
        }
        self.peers.broadcast(&Message::Chain(blocks)).await;
        Ok(true)
    }
}
