use anyhow::{Context, Result};
use ledger_core::{chain::ChainStore, Block};
use sled::Db;
use std::path::Path;
use tracing::{debug, info};

const TREE_CHAIN: &str = "chain";
const KEY_BLOCKS: &[u8] = b"blocks";

/// Whole chain as one bincode value under a single key. A single-key insert is
/// atomic in sled, so a crash mid-save leaves the previous chain intact.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("opening sled db at {}", path.display()))?;
    info!(path = %path.display(), "sled store opened");
    Ok(Self { db })
  }

  fn chain_tree(&self) -> Result<sled::Tree> {
    self.db.open_tree(TREE_CHAIN).context("opening chain tree")
  }

  /// Drop the persisted chain.
  pub fn clear(&self) -> Result<()> {
    self.chain_tree()?.clear()?;
    self.db.flush()?;
    Ok(())
  }

  pub fn close(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}

impl ChainStore for SledStore {
  fn load(&self) -> Result<Option<Vec<Block>>> {
    let tree = self.chain_tree()?;
    match tree.get(KEY_BLOCKS)? {
      Some(bytes) => {
        let blocks: Vec<Block> =
          bincode::deserialize(&bytes).context("decoding persisted chain")?;
        Ok(Some(blocks))
      }
      None => Ok(None),
    }
  }

  fn save(&self, blocks: &[Block]) -> Result<()> {
    let tree = self.chain_tree()?;
    let bytes = bincode::serialize(blocks).context("encoding chain")?;
    tree.insert(KEY_BLOCKS, bytes)?;
    self.db.flush().context("flushing sled")?;
    debug!(height = blocks.len(), "chain saved to sled");
    Ok(())
  }
}
