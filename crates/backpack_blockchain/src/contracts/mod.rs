//! # Contract Definitions
//!
//! The usage-rights contract interface the sync client queries.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall};

use crate::error::{SyncError, SyncResult};

sol! {
    /// Usage-rights registry: items carry an owner plus a time-limited user.
    #[derive(Debug)]
    interface IUsageRights {
        /// Items whose usage rights are currently held by `user`.
        function itemsOf(address user) external view returns (
            uint256[] tokenIds,
            uint256[] amounts,
            uint64[] expires
        );
    }
}

/// Parses a holder identity into an account address.
///
/// # Errors
///
/// `InvalidIdentity` if the string is not a 20-byte hex address.
pub fn parse_identity(identity: &str) -> SyncResult<Address> {
    identity
        .parse::<Address>()
        .map_err(|e| SyncError::InvalidIdentity(format!("{identity}: {e}")))
}

/// ABI calldata for `itemsOf(identity)`.
///
/// # Errors
///
/// `InvalidIdentity` if the identity is not an address.
pub fn encode_items_query(identity: &str) -> SyncResult<Bytes> {
    let user = parse_identity(identity)?;
    Ok(Bytes::from(IUsageRights::itemsOfCall { user }.abi_encode()))
}
