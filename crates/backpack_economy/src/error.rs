//! # Economy Error Types
//!
//! All errors that can occur in the ledger, catalog and crafting engine.

use thiserror::Error;

use crate::catalog::{ItemId, RecipeId};
use crate::record::Tick;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// The ledger is at its maximum record count.
    #[error("ledger full: capacity {capacity} records")]
    CapacityExceeded {
        /// Maximum number of records the ledger holds.
        capacity: usize,
    },

    /// No usable record matched a transfer or consume target.
    #[error("no usable record of item {item_id} held by {user}")]
    NotFound {
        /// The item that was looked up.
        item_id: ItemId,
        /// The usage-rights holder that was looked up.
        user: String,
    },

    /// A grant arrived already past its expiry tick.
    #[error("item {item_id} expired at tick {expires_at}, now {now}")]
    AlreadyExpired {
        /// The item granted.
        item_id: ItemId,
        /// Expiry of the incoming record.
        expires_at: Tick,
        /// Tick of the insert.
        now: Tick,
    },

    /// The transfer target already holds usage rights on the item.
    #[error("{user} already holds item {item_id}")]
    AlreadyHeld {
        /// The item being lent.
        item_id: ItemId,
        /// The transfer target.
        user: String,
    },

    /// A crafting requirement is not covered by the ledger.
    #[error("missing ingredients: need {required} of item {item_id}, have {available}")]
    MissingIngredients {
        /// The first item found short.
        item_id: ItemId,
        /// Units the recipe needs.
        required: u32,
        /// Usable units held.
        available: u32,
    },

    /// Recipe not found in the catalog.
    #[error("recipe not found: {0}")]
    RecipeNotFound(RecipeId),

    /// A record was created with zero uses.
    #[error("entitlement amount must be positive")]
    InvalidAmount,

    /// Invalid configuration file or catalog definition.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
