use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::constants::{
    GENESIS_DIFFICULTY, GENESIS_MINER, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP_MS,
};
use crate::error::{LedgerError, Result};

/// Milliseconds since the Unix epoch. A clock before 1970 reads as 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: u64,
}

impl Transaction {
    /// Create a transaction with a fresh random id, rejecting malformed fields.
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Result<Self> {
        let tx = Self {
            id: Uuid::new_v4().to_string(),
            from: from.into(),
            to: to.into(),
            amount,
            timestamp: now_millis(),
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Shape checks for transactions arriving from outside the node.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("missing id".into()));
        }
        if self.from.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("missing sender".into()));
        }
        if self.to.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("missing recipient".into()));
        }
        if self.amount == 0 {
            return Err(LedgerError::InvalidTransaction(
                "amount must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub miner: String,
    pub difficulty: u32,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// An unmined block on top of `previous_hash`, stamped with the current time.
    pub fn candidate(
        index: u64,
        previous_hash: impl Into<String>,
        miner: impl Into<String>,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: now_millis(),
            transactions,
            previous_hash: previous_hash.into(),
            miner: miner.into(),
            difficulty,
            nonce: 0,
            hash: String::new(),
        };
        block.seal();
        block
    }

    /// The shared first block. Every node derives the same one.
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: GENESIS_TIMESTAMP_MS,
            transactions: vec![],
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            miner: GENESIS_MINER.to_string(),
            difficulty: GENESIS_DIFFICULTY,
            nonce: 0,
            hash: String::new(),
        };
        block.seal();
        while !block.meets_difficulty() {
            block.nonce += 1;
            block.seal();
        }
        block
    }

    /// SHA-256 over every field except `hash`. Strings are length-prefixed so
    /// no two distinct blocks share a hash input.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}:{}:{}:",
            self.index,
            self.timestamp,
            self.transactions.len()
        ));
        for tx in &self.transactions {
            hash_text(&mut hasher, &tx.id);
            hash_text(&mut hasher, &tx.from);
            hash_text(&mut hasher, &tx.to);
            hasher.update(format!("{}:{}:", tx.amount, tx.timestamp));
        }
        hash_text(&mut hasher, &self.previous_hash);
        hash_text(&mut hasher, &self.miner);
        hasher.update(format!("{}:{}", self.nonce, self.difficulty));
        hex::encode(hasher.finalize())
    }

    /// Recompute `hash`; required after touching any other field.
    pub fn seal(&mut self) {
        self.hash = self.compute_hash();
    }

    pub fn meets_difficulty(&self) -> bool {
        count_leading_zero_digits(&self.hash) >= self.difficulty
    }

    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.transactions.iter().map(|tx| tx.id.as_str())
    }
}

fn hash_text(hasher: &mut Sha256, text: &str) {
    hasher.update(format!("{}:", text.len()));
    hasher.update(text.as_bytes());
}

/// Number of leading `'0'` characters in a hex digest.
pub fn count_leading_zero_digits(hash: &str) -> u32 {
    hash.chars().take_while(|c| *c == '0').count() as u32
}
