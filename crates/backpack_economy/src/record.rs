//! # Entitlement Records
//!
//! One record grants its `user` a bounded number of uses of an item until
//! `expires_at`. The `owner` is the original issuer and never changes, so
//! provenance survives lending.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;

/// Logical game time, in ticks.
pub type Tick = u64;

/// A time-limited right to use an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Item type this record grants.
    pub item_id: ItemId,
    /// Remaining uses.
    pub amount: u32,
    /// First tick at which the record is no longer usable.
    pub expires_at: Tick,
    /// Identity of the original issuing holder.
    pub owner: String,
    /// Identity of the current usage-rights holder.
    pub user: String,
}

impl EntitlementRecord {
    /// Creates a record owned and used by the same identity.
    #[must_use]
    pub fn new(item_id: ItemId, amount: u32, expires_at: Tick, holder: impl Into<String>) -> Self {
        let holder = holder.into();
        Self {
            item_id,
            amount,
            expires_at,
            owner: holder.clone(),
            user: holder,
        }
    }

    /// Sets a distinct usage-rights holder.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// True while the record still has uses and hasn't expired.
    #[inline]
    #[must_use]
    pub fn is_usable(&self, now: Tick) -> bool {
        self.amount > 0 && self.expires_at > now
    }

    /// True once `now` has reached the expiry tick.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: Tick) -> bool {
        self.expires_at <= now
    }

    /// True when the record was lent out by its owner.
    #[inline]
    #[must_use]
    pub fn is_lent(&self) -> bool {
        self.owner != self.user
    }
}
