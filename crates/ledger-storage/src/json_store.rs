use anyhow::{Context, Result};
use ledger_core::{chain::ChainStore, Block};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The chain as a single pretty-printed JSON document.
///
/// Saves go to a sibling `.tmp` file which is synced and then renamed over the
/// target, so readers never observe a half-written document.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn temp_path(&self) -> PathBuf {
    let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    self.path.with_file_name(name)
  }
}

impl ChainStore for JsonFileStore {
  fn load(&self) -> Result<Option<Vec<Block>>> {
    let bytes = match fs::read(&self.path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
    };
    let blocks = serde_json::from_slice(&bytes)
      .with_context(|| format!("decoding {}", self.path.display()))?;
    Ok(Some(blocks))
  }

  fn save(&self, blocks: &[Block]) -> Result<()> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = self.temp_path();
    {
      let mut file =
        File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
      serde_json::to_writer_pretty(&mut file, blocks).context("encoding chain")?;
      file.flush()?;
      file.sync_all().with_context(|| format!("syncing {}", tmp.display()))?;
    }
    fs::rename(&tmp, &self.path)
      .with_context(|| format!("renaming {} into place", tmp.display()))?;
    debug!(height = blocks.len(), path = %self.path.display(), "chain saved to json");
    Ok(())
  }
}
