use serde::{Deserialize, Serialize};

use crate::block::{Block, Transaction};
use crate::error::{LedgerError, Result};

/// Node-to-node gossip envelope, e.g. `{"type":"block","data":{...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Message {
    Block(Block),
    Transaction(Transaction),
    Chain(Vec<Block>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Block(_) => "block",
            Message::Transaction(_) => "transaction",
            Message::Chain(_) => "chain",
        }
    }

    /// One JSON document per line on the wire.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| LedgerError::MalformedMessage(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| LedgerError::MalformedMessage(e.to_string()))
    }
}
