//! Session configuration, loaded once at startup.
//!
//! ```toml
//! [ledger]
//! capacity = 100
//! craft_ttl = 3600
//!
//! [sync]
//! rpc_url = "https://sepolia.era.zksync.dev"
//! timeout_ms = 5000
//! ```

use backpack_blockchain::SyncConfig;
use backpack_economy::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SessionError, SessionResult};

/// Ledger and sync settings for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `[ledger]` table.
    pub ledger: LedgerConfig,
    /// `[sync]` table.
    pub sync: SyncConfig,
}

impl SessionConfig {
    /// Parses and validates TOML text. Missing tables and fields take defaults.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if parsing or validation fails.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigIo` if the file can't be read
    /// - `InvalidConfig` if parsing or validation fails
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "session config loaded");
        Ok(config)
    }

    /// Validates both tables.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> SessionResult<()> {
        self.ledger
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        self.sync
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }
}
