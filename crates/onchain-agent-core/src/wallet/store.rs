//! Persistence of the agent's wallet identity

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::WalletData;
use crate::error::{Error, Result};

/// File holding exported [`WalletData`] as JSON
#[derive(Debug, Clone)]
pub struct WalletStore {
    path: PathBuf,
}

impl WalletStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read persisted wallet data, `None` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<WalletData>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No persisted wallet data");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let data: WalletData = serde_json::from_str(&contents).map_err(|e| {
            Error::WalletError(format!(
                "Wallet data file {} is not valid: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(data))
    }

    /// Overwrite the file with the given wallet data
    pub fn save(&self, data: &WalletData) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        info!(path = %self.path.display(), wallet_id = %data.wallet_id, "Persisted wallet data");
        Ok(())
    }
}
