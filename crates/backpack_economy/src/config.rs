//! Ledger configuration, loaded once at session start.

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};
use crate::ledger::DEFAULT_CAPACITY;
use crate::record::Tick;

/// Lifetime of a crafted output, in ticks.
pub const DEFAULT_CRAFT_TTL: Tick = 3600;

/// Sizing and timing for the ledger and crafting engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum record count.
    pub capacity: usize,
    /// Ticks a crafted output stays usable.
    pub craft_ttl: Tick,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            craft_ttl: DEFAULT_CRAFT_TTL,
        }
    }
}

impl LedgerConfig {
    /// Parses a `LedgerConfig` table from TOML text.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the text is malformed or a value is out of range.
    pub fn from_toml_str(text: &str) -> EconomyResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EconomyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the capacity or the craft TTL is zero.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.capacity == 0 {
            return Err(EconomyError::InvalidConfig(
                "ledger capacity must be positive".to_string(),
            ));
        }
        if self.craft_ttl == 0 {
            return Err(EconomyError::InvalidConfig(
                "craft_ttl must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
