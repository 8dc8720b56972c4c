//! # BACKPACK
//!
//! Item entitlements for a running game session.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  SyncEvent   ┌─────────────────────┐
//! │  SyncWorker     │ ───────────▶ │ EntitlementSession  │
//! │  (tokio task)   │   channel    │  Ledger + Crafting  │
//! └─────────────────┘              └──────────┬──────────┘
//!                                             │ gate(now)
//!                                             ▼
//!                                  ┌─────────────────────┐
//!                                  │  EntitlementGate    │
//!                                  │  enhanced/standard  │
//!                                  └─────────────────────┘
//! ```
//!
//! Everything degrades to standard behavior: an empty, stale or unsynced
//! ledger never stops play.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod gameplay;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use gameplay::{
    Cue, Effect, EntitlementGate, Outcome, PlayerState, PowerUp, Presentation, Sound,
    StandardBehavior, INVULN_TICS,
};
pub use session::EntitlementSession;

pub use backpack_blockchain as sync;
pub use backpack_economy as economy;
