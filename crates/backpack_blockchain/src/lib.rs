//! # BACKPACK Blockchain Bridge
//!
//! Pulls a holder's usage rights from a JSON-RPC endpoint and hands them to
//! the game loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   eth_call   ┌─────────────────┐
//! │  Usage-rights   │ ◀──────────  │ RemoteSyncClient│
//! │  Contract       │ ──────────▶  │ (timed request) │
//! └─────────────────┘    items     └────────┬────────┘
//!                                           │ SyncEvent
//!                                           ▼
//!                                  ┌─────────────────┐
//!                                  │  Game loop      │
//!                                  │  (sole writer)  │
//!                                  └─────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! - Every request is bounded by `timeout_ms`
//! - A failed or malformed fetch changes nothing; the caller keeps its state

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod client;
pub mod contracts;
pub mod error;
pub mod rpc;
pub mod worker;

pub use client::{RemoteSyncClient, SyncConfig};
pub use contracts::{encode_items_query, parse_identity, IUsageRights};
pub use error::{NetworkFailure, SyncError, SyncResult};
pub use rpc::{decode_items, encode_items, RpcRequest};
pub use worker::{SyncEvent, SyncStats, SyncWorker};
