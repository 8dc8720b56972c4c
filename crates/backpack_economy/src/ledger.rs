//! # Entitlement Ledger
//!
//! The in-memory authoritative store of entitlement records for one game
//! session.
//!
//! ## Storage
//!
//! Records are keyed by `(user, item_id)`, so a query resolves to at most one
//! record and removal never shifts unrelated entries. Inserting a record for
//! a key that already exists merges into it:
//!
//! ```text
//! existing usable  ──▶ amounts add, expiry = later of the two
//! existing stale   ──▶ replaced by the incoming record
//! no existing      ──▶ new key, counts against capacity
//! ```
//!
//! A record that is already expired on arrival is refused, never merged.
//!
//! ## Expiry
//!
//! Expiry is lazy: `has`, `consume` and `list` treat expired or exhausted
//! records as absent without removing them. [`Ledger::purge_expired`] is
//! the explicit sweep.

use std::collections::btree_map::{self, Entry};
use std::collections::{BTreeMap, HashMap};

use crate::catalog::ItemId;
use crate::config::LedgerConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::record::{EntitlementRecord, Tick};

/// Maximum record count when no configuration overrides it.
pub const DEFAULT_CAPACITY: usize = 100;

/// Capacity-bounded store of entitlement records.
#[derive(Clone, Debug)]
pub struct Ledger {
    /// Records per usage-rights holder, ordered by item id.
    holders: HashMap<String, BTreeMap<ItemId, EntitlementRecord>>,
    /// Total record count across holders.
    len: usize,
    /// Maximum record count.
    capacity: usize,
}

impl Ledger {
    /// Creates an empty ledger holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            holders: HashMap::new(),
            len: 0,
            capacity,
        }
    }

    /// Creates an empty ledger sized from configuration.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Number of records held, usable or not.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when no records are held.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum record count.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when a new key would be refused.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Raw record for `(user, item_id)`, whether usable or not.
    #[must_use]
    pub fn get(&self, user: &str, item_id: ItemId) -> Option<&EntitlementRecord> {
        self.holders.get(user)?.get(&item_id)
    }

    /// True iff `user` holds a usable record of `item_id` at `now`.
    #[must_use]
    pub fn has(&self, user: &str, item_id: ItemId, now: Tick) -> bool {
        self.get(user, item_id).is_some_and(|r| r.is_usable(now))
    }

    /// Usable units of `item_id` held by `user`, zero when unusable.
    #[must_use]
    pub fn amount(&self, user: &str, item_id: ItemId, now: Tick) -> u32 {
        self.get(user, item_id)
            .filter(|r| r.is_usable(now))
            .map_or(0, |r| r.amount)
    }

    /// Spends one use of `item_id`. The record is removed when it reaches zero.
    ///
    /// Silently does nothing when `user` holds no usable record; the return
    /// value reports whether a unit was spent.
    pub fn consume(&mut self, user: &str, item_id: ItemId, now: Tick) -> bool {
        let Some(record) = self
            .holders
            .get_mut(user)
            .and_then(|records| records.get_mut(&item_id))
        else {
            return false;
        };
        if !record.is_usable(now) {
            return false;
        }

        record.amount -= 1;
        let remaining = record.amount;
        if remaining == 0 {
            self.remove(user, item_id);
        }

        tracing::debug!(user, item_id, remaining, "entitlement consumed");
        true
    }

    /// Grants `user` a new entitlement expiring `ttl` ticks after `now`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is zero
    /// - `AlreadyExpired` if `ttl` is zero
    /// - `CapacityExceeded` if a new key is needed and the ledger is full
    pub fn create(
        &mut self,
        user: &str,
        item_id: ItemId,
        amount: u32,
        ttl: Tick,
        now: Tick,
    ) -> EconomyResult<()> {
        let record = EntitlementRecord::new(item_id, amount, now.saturating_add(ttl), user);
        self.insert(record, now)?;
        tracing::debug!(user, item_id, amount, ttl, "entitlement created");
        Ok(())
    }

    /// Inserts a record under its own `(user, item_id)` key, merging into an
    /// existing record for that key.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the record has no uses
    /// - `AlreadyExpired` if the record is past its expiry at `now`
    /// - `CapacityExceeded` if a new key is needed and the ledger is full
    pub fn insert(&mut self, record: EntitlementRecord, now: Tick) -> EconomyResult<()> {
        if record.amount == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        if record.is_expired(now) {
            return Err(EconomyError::AlreadyExpired {
                item_id: record.item_id,
                expires_at: record.expires_at,
                now,
            });
        }

        if let Some(existing) = self
            .holders
            .get_mut(&record.user)
            .and_then(|records| records.get_mut(&record.item_id))
        {
            merge(existing, record, now);
            return Ok(());
        }

        if self.is_full() {
            return Err(EconomyError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.holders
            .entry(record.user.clone())
            .or_default()
            .insert(record.item_id, record);
        self.len += 1;
        Ok(())
    }

    /// Lends the usable record of `item_id` held by `from` to `to`.
    ///
    /// The record moves: `from` loses the usage rights, `owner` is kept and
    /// the grant expires `ttl` ticks after `now`. A grant is never folded
    /// into a record `to` already uses, so its expiry and owner stay intact.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `from` holds no usable record of the item
    /// - `AlreadyHeld` if `to` already holds a usable record of the item
    /// - `AlreadyExpired` if `ttl` is zero
    ///
    /// The ledger is unchanged on error.
    pub fn transfer(
        &mut self,
        from: &str,
        item_id: ItemId,
        to: &str,
        ttl: Tick,
        now: Tick,
    ) -> EconomyResult<()> {
        let not_found = || EconomyError::NotFound {
            item_id,
            user: from.to_string(),
        };

        if !self.has(from, item_id, now) {
            return Err(not_found());
        }
        if self.has(to, item_id, now) {
            return Err(EconomyError::AlreadyHeld {
                item_id,
                user: to.to_string(),
            });
        }
        let expires_at = now.saturating_add(ttl);
        if expires_at <= now {
            return Err(EconomyError::AlreadyExpired {
                item_id,
                expires_at,
                now,
            });
        }

        let mut record = self.remove(from, item_id).ok_or_else(not_found)?;
        record.user = to.to_string();
        record.expires_at = expires_at;
        let returned = !record.is_lent();

        // The removal freed a slot and any record `to` has is stale, so the
        // insert replaces it or takes the freed slot.
        self.insert(record, now)?;

        tracing::debug!(from, to, item_id, ttl, returned, "entitlement transferred");
        Ok(())
    }

    /// Usable records held by `user` at `now`, in item-id order.
    #[must_use]
    pub fn list(&self, user: &str, now: Tick) -> Entitlements<'_> {
        Entitlements {
            records: self.holders.get(user).map(BTreeMap::values),
            usable_at: Some(now),
        }
    }

    /// Every record held by `user`, including expired ones.
    #[must_use]
    pub fn list_unfiltered(&self, user: &str) -> Entitlements<'_> {
        Entitlements {
            records: self.holders.get(user).map(BTreeMap::values),
            usable_at: None,
        }
    }

    /// Every record in the ledger.
    pub fn iter(&self) -> impl Iterator<Item = &EntitlementRecord> {
        self.holders.values().flat_map(BTreeMap::values)
    }

    /// Removes every record unusable at `now`. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Tick) -> usize {
        let mut removed = 0;
        self.holders.retain(|_, records| {
            let before = records.len();
            // Stored records always have uses left, so expiry is the only test
            records.retain(|_, record| !record.is_expired(now));
            removed += before - records.len();
            !records.is_empty()
        });
        self.len -= removed;

        if removed > 0 {
            tracing::debug!(removed, now, "expired entitlements purged");
        }
        removed
    }

    /// Swaps every record used by `holder` for `records` in one step.
    ///
    /// Duplicate items inside `records` merge, records that are already
    /// unusable at `now` are skipped, and records addressed to another user
    /// are dropped. Returns the number of records now held by `holder`.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if the swap would overflow the ledger; nothing
    /// changes in that case.
    pub fn replace_holder(
        &mut self,
        holder: &str,
        records: impl IntoIterator<Item = EntitlementRecord>,
        now: Tick,
    ) -> EconomyResult<usize> {
        let mut incoming: BTreeMap<ItemId, EntitlementRecord> = BTreeMap::new();

        for record in records {
            if record.user != holder {
                tracing::warn!(
                    holder,
                    user = %record.user,
                    item_id = record.item_id,
                    "dropping synced record addressed to another user"
                );
                continue;
            }
            if !record.is_usable(now) {
                continue;
            }
            match incoming.entry(record.item_id) {
                Entry::Occupied(mut slot) => merge(slot.get_mut(), record, now),
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }

        let current = self.holders.get(holder).map_or(0, BTreeMap::len);
        let projected = self.len - current + incoming.len();
        if projected > self.capacity {
            return Err(EconomyError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let count = incoming.len();
        if incoming.is_empty() {
            self.holders.remove(holder);
        } else {
            self.holders.insert(holder.to_string(), incoming);
        }
        self.len = projected;

        Ok(count)
    }

    /// Creates a snapshot of the ledger for rollback.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            holders: self.holders.clone(),
            len: self.len,
        }
    }

    /// Restores the ledger from a snapshot (rollback).
    pub fn restore(&mut self, snapshot: &LedgerSnapshot) {
        self.holders.clone_from(&snapshot.holders);
        self.len = snapshot.len;
    }

    fn remove(&mut self, user: &str, item_id: ItemId) -> Option<EntitlementRecord> {
        let records = self.holders.get_mut(user)?;
        let removed = records.remove(&item_id)?;
        if records.is_empty() {
            self.holders.remove(user);
        }
        self.len -= 1;
        Some(removed)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Folds `incoming` into the record already held for the same key.
///
/// Callers only pass an `incoming` record that is usable at `now`.
fn merge(existing: &mut EntitlementRecord, incoming: EntitlementRecord, now: Tick) {
    if existing.is_usable(now) {
        existing.amount = existing.amount.saturating_add(incoming.amount);
        existing.expires_at = existing.expires_at.max(incoming.expires_at);
    } else {
        *existing = incoming;
    }
}

/// Snapshot of ledger state for transactional rollback.
#[derive(Clone, Debug)]
pub struct LedgerSnapshot {
    holders: HashMap<String, BTreeMap<ItemId, EntitlementRecord>>,
    len: usize,
}

/// Lazy iterator over one holder's records.
///
/// Cloning before iterating gives an independent pass over the same records.
#[derive(Clone, Debug)]
pub struct Entitlements<'a> {
    records: Option<btree_map::Values<'a, ItemId, EntitlementRecord>>,
    /// Filter out records unusable at this tick; `None` yields everything.
    usable_at: Option<Tick>,
}

impl<'a> Iterator for Entitlements<'a> {
    type Item = &'a EntitlementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records.as_mut()?;
        match self.usable_at {
            Some(now) => records.find(|record| record.is_usable(now)),
            None => records.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HERB, POTION, SHIELD, SWORD};

    #[test]
    fn test_create_and_has() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SWORD, 1, 3600, 0).unwrap();

        assert!(ledger.has("alice", SWORD, 10));
        assert!(!ledger.has("bob", SWORD, 10));
        assert!(!ledger.has("alice", SHIELD, 10));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_consume_removes_at_zero() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SWORD, 2, 3600, 0).unwrap();

        assert!(ledger.consume("alice", SWORD, 10));
        assert_eq!(ledger.amount("alice", SWORD, 10), 1);

        assert!(ledger.consume("alice", SWORD, 10));
        assert!(ledger.get("alice", SWORD).is_none());
        assert!(ledger.is_empty());

        // Nothing left: silent no-op
        assert!(!ledger.consume("alice", SWORD, 10));
    }

    #[test]
    fn test_expired_is_absent_but_retained() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 3, 100, 0).unwrap();

        assert!(ledger.has("alice", HERB, 99));
        assert!(!ledger.has("alice", HERB, 100));
        assert!(!ledger.consume("alice", HERB, 100));

        // Lazy expiry keeps the raw record
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.list("alice", 100).count(), 0);
        assert_eq!(ledger.list_unfiltered("alice").count(), 1);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut ledger = Ledger::new(10);
        assert_eq!(
            ledger.create("alice", SWORD, 0, 100, 0),
            Err(EconomyError::InvalidAmount)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_merge_on_same_key() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 1, 100, 0).unwrap();
        ledger.create("alice", HERB, 1, 500, 50).unwrap();

        let record = ledger.get("alice", HERB).unwrap();
        assert_eq!(record.amount, 2);
        assert_eq!(record.expires_at, 550);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_merge_replaces_stale_record() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 5, 100, 0).unwrap();
        ledger.create("alice", HERB, 1, 100, 200).unwrap();

        let record = ledger.get("alice", HERB).unwrap();
        assert_eq!(record.amount, 1);
        assert_eq!(record.expires_at, 300);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut ledger = Ledger::new(2);
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();
        ledger.create("alice", SHIELD, 1, 100, 0).unwrap();

        let result = ledger.create("alice", HERB, 1, 100, 0);
        assert_eq!(result, Err(EconomyError::CapacityExceeded { capacity: 2 }));
        assert_eq!(ledger.len(), 2);

        // Merging into an existing key needs no new slot
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();
        assert_eq!(ledger.amount("alice", SWORD, 0), 2);
    }

    #[test]
    fn test_transfer_moves_usage_rights() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SHIELD, 3, 100, 0).unwrap();

        ledger.transfer("alice", SHIELD, "bob", 50, 10).unwrap();

        assert!(!ledger.has("alice", SHIELD, 10));
        assert!(ledger.has("bob", SHIELD, 10));

        let record = ledger.get("bob", SHIELD).unwrap();
        assert_eq!(record.owner, "alice");
        assert_eq!(record.user, "bob");
        assert_eq!(record.amount, 3);
        assert_eq!(record.expires_at, 60);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_transfer_not_found() {
        let mut ledger = Ledger::new(10);
        let result = ledger.transfer("alice", SHIELD, "bob", 50, 10);
        assert!(matches!(result, Err(EconomyError::NotFound { item_id: SHIELD, .. })));

        // Expired records can't be lent either
        ledger.create("alice", SHIELD, 1, 5, 0).unwrap();
        assert!(ledger.transfer("alice", SHIELD, "bob", 50, 10).is_err());
        assert!(ledger.get("alice", SHIELD).is_some());
    }

    #[test]
    fn test_transfer_at_full_capacity() {
        let mut ledger = Ledger::new(1);
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();
        ledger.transfer("alice", SWORD, "bob", 100, 0).unwrap();
        assert!(ledger.has("bob", SWORD, 0));
    }

    #[test]
    fn test_expired_grant_rejected() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 1, 100, 0).unwrap();

        assert_eq!(
            ledger.create("alice", HERB, 5, 0, 10),
            Err(EconomyError::AlreadyExpired {
                item_id: HERB,
                expires_at: 10,
                now: 10,
            })
        );
        assert!(matches!(
            ledger.insert(EntitlementRecord::new(HERB, 7, 5, "alice"), 10),
            Err(EconomyError::AlreadyExpired { .. })
        ));

        let record = ledger.get("alice", HERB).unwrap();
        assert_eq!(record.amount, 1);
        assert_eq!(record.expires_at, 100);
    }

    #[test]
    fn test_expired_grant_does_not_revive_stale_record() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 2, 10, 0).unwrap();

        assert!(ledger.create("alice", HERB, 3, 0, 20).is_err());
        assert!(!ledger.has("alice", HERB, 20));
        assert_eq!(ledger.amount("alice", HERB, 20), 0);
    }

    #[test]
    fn test_transfer_refused_when_target_holds_item() {
        let mut ledger = Ledger::new(10);
        ledger.create("bob", SHIELD, 1, 10_000, 0).unwrap();
        ledger.create("alice", SHIELD, 3, 10_000, 0).unwrap();
        let before = ledger.snapshot();

        let result = ledger.transfer("alice", SHIELD, "bob", 50, 0);

        assert_eq!(
            result,
            Err(EconomyError::AlreadyHeld {
                item_id: SHIELD,
                user: "bob".to_string(),
            })
        );
        assert_eq!(ledger.len(), before.len);
        assert_eq!(ledger.amount("alice", SHIELD, 0), 3);
        assert_eq!(ledger.amount("bob", SHIELD, 0), 1);
        assert_eq!(ledger.get("bob", SHIELD).unwrap().owner, "bob");
    }

    #[test]
    fn test_transfer_replaces_stale_target_record() {
        let mut ledger = Ledger::new(10);
        ledger.create("bob", SHIELD, 4, 5, 0).unwrap();
        ledger.create("alice", SHIELD, 3, 10_000, 0).unwrap();

        ledger.transfer("alice", SHIELD, "bob", 50, 10).unwrap();

        let record = ledger.get("bob", SHIELD).unwrap();
        assert_eq!(record.amount, 3);
        assert_eq!(record.owner, "alice");
        assert_eq!(record.expires_at, 60);
        assert!(!ledger.has("bob", SHIELD, 60));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_transfer_with_zero_ttl_refused() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();

        assert!(matches!(
            ledger.transfer("alice", SWORD, "bob", 0, 10),
            Err(EconomyError::AlreadyExpired { .. })
        ));
        assert!(ledger.has("alice", SWORD, 10));
    }

    #[test]
    fn test_list_is_restartable_and_ordered() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", POTION, 1, 100, 0).unwrap();
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();
        ledger.create("bob", HERB, 1, 100, 0).unwrap();

        let listing = ledger.list("alice", 0);
        let first: Vec<ItemId> = listing.clone().map(|r| r.item_id).collect();
        let second: Vec<ItemId> = listing.map(|r| r.item_id).collect();

        assert_eq!(first, vec![SWORD, POTION]);
        assert_eq!(first, second);
        assert_eq!(ledger.list("nobody", 0).count(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SWORD, 1, 10, 0).unwrap();
        ledger.create("alice", SHIELD, 1, 100, 0).unwrap();
        ledger.create("bob", HERB, 1, 10, 0).unwrap();

        assert_eq!(ledger.purge_expired(50), 2);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has("alice", SHIELD, 50));
        assert_eq!(ledger.list_unfiltered("bob").count(), 0);
    }

    #[test]
    fn test_replace_holder_swaps_set() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", SWORD, 1, 100, 0).unwrap();
        ledger.create("bob", HERB, 1, 100, 0).unwrap();

        let synced = vec![
            EntitlementRecord::new(HERB, 2, 1000, "alice"),
            EntitlementRecord::new(HERB, 1, 1000, "alice"),
            EntitlementRecord::new(POTION, 0, 1000, "alice"),
            EntitlementRecord::new(SHIELD, 1, 1000, "carol"),
        ];
        let held = ledger.replace_holder("alice", synced, 0).unwrap();

        assert_eq!(held, 1);
        assert!(!ledger.has("alice", SWORD, 0));
        assert_eq!(ledger.amount("alice", HERB, 0), 3);
        assert!(!ledger.has("carol", SHIELD, 0));
        assert!(ledger.has("bob", HERB, 0));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_replace_holder_overflow_leaves_ledger_untouched() {
        let mut ledger = Ledger::new(2);
        ledger.create("bob", HERB, 1, 100, 0).unwrap();

        let synced = vec![
            EntitlementRecord::new(SWORD, 1, 1000, "alice"),
            EntitlementRecord::new(SHIELD, 1, 1000, "alice"),
        ];
        let result = ledger.replace_holder("alice", synced, 0);

        assert!(matches!(result, Err(EconomyError::CapacityExceeded { .. })));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has("bob", HERB, 0));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut ledger = Ledger::new(10);
        ledger.create("alice", HERB, 2, 100, 0).unwrap();

        let snapshot = ledger.snapshot();
        ledger.consume("alice", HERB, 0);
        ledger.consume("alice", HERB, 0);
        assert!(ledger.is_empty());

        ledger.restore(&snapshot);
        assert_eq!(ledger.amount("alice", HERB, 0), 2);
        assert_eq!(ledger.len(), 1);
    }
}
