//! # BACKPACK Economy
//!
//! The entitlement ledger and everything that reads or writes it directly.
//!
//! ## Design Principles
//!
//! 1. **Single source of truth** - item state lives only in the [`Ledger`]
//! 2. **One record per key** - `(user, item_id)` resolves to at most one record
//! 3. **Lazy expiry** - expired records read as absent until purged
//! 4. **Transactional crafting** - all-or-nothing recipe execution
//!
//! ## Thread Safety
//!
//! The ledger is plain owned state with no interior locking. The game loop
//! is its only writer; remote sync results are handed to the loop rather
//! than applied from another thread.
//!
//! ## Example
//!
//! ```rust
//! use backpack_economy::{Ledger, catalog::SWORD};
//!
//! let mut ledger = Ledger::default();
//! ledger.create("alice", SWORD, 1, 3600, 0).unwrap();
//! assert!(ledger.has("alice", SWORD, 10));
//!
//! assert!(ledger.consume("alice", SWORD, 10));
//! assert!(!ledger.has("alice", SWORD, 10));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod config;
pub mod crafting;
pub mod error;
pub mod ledger;
pub mod record;

pub use catalog::{ItemCatalog, ItemDef, ItemId, Recipe, RecipeId, RecipeItem};
pub use config::{LedgerConfig, DEFAULT_CRAFT_TTL};
pub use crafting::CraftingEngine;
pub use error::{EconomyError, EconomyResult};
pub use ledger::{Entitlements, Ledger, LedgerSnapshot, DEFAULT_CAPACITY};
pub use record::{EntitlementRecord, Tick};
