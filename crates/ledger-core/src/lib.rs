//! Core types and rules of the replicated ledger: blocks, proof-of-work,
//! difficulty, the transaction pool, validation and the chain state machine.

pub mod block;
pub mod chain;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod message;
pub mod pool;
pub mod pow;
pub mod validate;

pub use block::{count_leading_zero_digits, now_millis, Block, Transaction};
pub use chain::{Chain, ChainStore, MemoryStore};
pub use error::{LedgerError, ValidationError};
pub use message::Message;
pub use pool::TxPool;
