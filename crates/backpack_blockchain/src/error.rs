//! # Sync Error Types
//!
//! Transport failures and payload failures are kept apart so callers can
//! tell "the endpoint is down" from "the endpoint answered nonsense".

use std::fmt;
use thiserror::Error;

/// Why a request never produced a usable response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    /// The connection could not be established.
    Connect,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The endpoint answered with a non-success HTTP status.
    Status(u16),
    /// Any other transport-level failure.
    Transport,
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Timeout => write!(f, "timeout"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// Errors that can occur while syncing with the remote ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The remote service could not be reached in time.
    #[error("network error ({kind}): {detail}")]
    Network {
        /// Failure class.
        kind: NetworkFailure,
        /// Transport message.
        detail: String,
    },

    /// The response body did not have the expected shape.
    ///
    /// The whole batch is rejected; `index` names the offending item when
    /// the envelope itself parsed.
    #[error("malformed payload (item {index:?}): {reason}")]
    Format {
        /// Position of the bad item in `result.items`.
        index: Option<usize>,
        /// Parser message.
        reason: String,
    },

    /// The endpoint returned a JSON-RPC error object.
    #[error("remote error {code}: {message}")]
    Remote {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The query identity is not a valid account address.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Invalid sync configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// True for transport and timeout failures.
    #[inline]
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// True when the request timed out.
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Network {
                kind: NetworkFailure::Timeout,
                ..
            }
        )
    }

    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            NetworkFailure::Timeout
        } else if error.is_connect() {
            NetworkFailure::Connect
        } else if let Some(status) = error.status() {
            NetworkFailure::Status(status.as_u16())
        } else {
            NetworkFailure::Transport
        };

        Self::Network {
            kind,
            detail: error.to_string(),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
