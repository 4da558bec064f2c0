use std::collections::HashSet;

use crate::block::Transaction;

/// Unconfirmed transactions, de-duplicated by id and kept in arrival order.
#[derive(Debug, Default)]
pub struct TxPool {
    txs: Vec<Transaction>,
    ids: HashSet<String>,
}

impl TxPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tx` unless its id is already pooled. Returns whether it was added.
    pub fn add(&mut self, tx: Transaction) -> bool {
        if !self.ids.insert(tx.id.clone()) {
            return false;
        }
        self.txs.push(tx);
        true
    }

    /// Take every pooled transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        self.ids.clear();
        std::mem::take(&mut self.txs)
    }

    /// Evict every transaction whose id appears in `ids`. Returns how many went.
    pub fn remove<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let confirmed: HashSet<&str> = ids.into_iter().collect();
        let before = self.txs.len();
        self.txs.retain(|tx| !confirmed.contains(tx.id.as_str()));
        for id in &confirmed {
            self.ids.remove(*id);
        }
        before - self.txs.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
