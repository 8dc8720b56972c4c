//! Session-level errors.

use backpack_blockchain::SyncError;
use backpack_economy::EconomyError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`EntitlementSession`](crate::EntitlementSession).
///
/// None of these end the session; callers log and keep playing.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A ledger or crafting operation was refused.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// A remote sync attempt failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ConfigIo {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration text is malformed or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
