//! # Entitlement Session
//!
//! The only surface gameplay and menu code call into. Owns the ledger and
//! the crafting engine for one running game.
//!
//! Sync results arrive as [`SyncEvent`]s and are applied here, on the game
//! thread, so the ledger never has a second writer.

use backpack_blockchain::{RemoteSyncClient, SyncEvent};
use backpack_economy::{
    CraftingEngine, EconomyResult, EntitlementRecord, Entitlements, ItemCatalog, ItemId, Ledger,
    RecipeId, Tick,
};
use crossbeam_channel::Receiver;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::gameplay::{EntitlementGate, Presentation, StandardBehavior};

/// Ledger plus crafting for one game session.
#[derive(Clone, Debug)]
pub struct EntitlementSession {
    ledger: Ledger,
    crafting: CraftingEngine,
}

impl EntitlementSession {
    /// Creates an empty session over the standard catalog.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_catalog(ItemCatalog::standard(), config)
    }

    /// Creates an empty session over a custom catalog.
    #[must_use]
    pub fn with_catalog(catalog: ItemCatalog, config: &SessionConfig) -> Self {
        Self {
            ledger: Ledger::from_config(&config.ledger),
            crafting: CraftingEngine::from_config(catalog, &config.ledger),
        }
    }

    /// Read-only view of the ledger.
    #[inline]
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Item and recipe definitions.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &ItemCatalog {
        self.crafting.catalog()
    }

    /// Whether `user` can use `item_id` at `now`.
    #[must_use]
    pub fn has(&self, user: &str, item_id: ItemId, now: Tick) -> bool {
        self.ledger.has(user, item_id, now)
    }

    /// Spends one use. Returns `false` if there was nothing to spend.
    pub fn consume(&mut self, user: &str, item_id: ItemId, now: Tick) -> bool {
        self.ledger.consume(user, item_id, now)
    }

    /// Grants `amount` uses of `item_id` to `user` for `ttl` ticks.
    ///
    /// # Errors
    ///
    /// See [`Ledger::create`].
    pub fn create(
        &mut self,
        user: &str,
        item_id: ItemId,
        amount: u32,
        ttl: Tick,
        now: Tick,
    ) -> EconomyResult<()> {
        self.ledger.create(user, item_id, amount, ttl, now)
    }

    /// Lends `from`'s usage rights on `item_id` to `to` for `ttl` ticks.
    ///
    /// # Errors
    ///
    /// See [`Ledger::transfer`].
    pub fn transfer(
        &mut self,
        from: &str,
        item_id: ItemId,
        to: &str,
        ttl: Tick,
        now: Tick,
    ) -> EconomyResult<()> {
        self.ledger.transfer(from, item_id, to, ttl, now)
    }

    /// Usable records held by `user`.
    #[must_use]
    pub fn list(&self, user: &str, now: Tick) -> Entitlements<'_> {
        self.ledger.list(user, now)
    }

    /// Every record held by `user`, expired ones included.
    #[must_use]
    pub fn list_unfiltered(&self, user: &str) -> Entitlements<'_> {
        self.ledger.list_unfiltered(user)
    }

    /// Crafts a recipe for `user`.
    ///
    /// # Errors
    ///
    /// See [`CraftingEngine::craft`].
    pub fn craft(
        &mut self,
        user: &str,
        recipe_id: RecipeId,
        now: Tick,
    ) -> EconomyResult<EntitlementRecord> {
        self.crafting.craft(&mut self.ledger, user, recipe_id, now)
    }

    /// Gated gameplay actions for this tick.
    pub fn gate<'a, S: StandardBehavior, P: Presentation>(
        &'a mut self,
        standard: &'a mut S,
        presentation: &'a mut P,
        now: Tick,
    ) -> EntitlementGate<'a, S, P> {
        EntitlementGate::new(&mut self.ledger, standard, presentation, now)
    }

    /// Applies one sync result.
    ///
    /// A snapshot replaces everything its holder had. Returns the number of
    /// records the holder holds afterwards.
    ///
    /// # Errors
    ///
    /// - `Sync` for a failed fetch
    /// - `Economy` if the snapshot doesn't fit; the ledger is unchanged
    pub fn apply_sync(&mut self, event: SyncEvent, now: Tick) -> SessionResult<usize> {
        match event {
            SyncEvent::Snapshot {
                holder,
                records,
                latency,
            } => {
                let received = records.len();
                let held = self.ledger.replace_holder(&holder, records, now)?;
                tracing::info!(
                    holder = %holder,
                    received,
                    held,
                    latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    "entitlement sync applied"
                );
                Ok(held)
            }
            SyncEvent::Failed { error, .. } => Err(SessionError::Sync(error)),
        }
    }

    /// Applies every event waiting on `receiver` without blocking.
    ///
    /// Failures are logged and skipped. Returns how many snapshots were applied.
    pub fn drain_sync(&mut self, receiver: &Receiver<SyncEvent>, now: Tick) -> usize {
        let mut applied = 0;
        for event in receiver.try_iter() {
            let holder = event.holder().to_string();
            match self.apply_sync(event, now) {
                Ok(_) => applied += 1,
                Err(error) => {
                    tracing::warn!(holder = %holder, %error, "sync result not applied");
                }
            }
        }
        applied
    }

    /// Fetches `holder`'s records and applies them.
    ///
    /// Meant for session setup; during play use a
    /// [`SyncWorker`](backpack_blockchain::SyncWorker) and [`drain_sync`](Self::drain_sync).
    ///
    /// # Errors
    ///
    /// Same as [`apply_sync`](Self::apply_sync). The ledger is unchanged on error.
    pub async fn sync_from(
        &mut self,
        client: &RemoteSyncClient,
        holder: &str,
        now: Tick,
    ) -> SessionResult<usize> {
        let records = client.fetch(holder).await?;
        let held = self.ledger.replace_holder(holder, records, now)?;
        tracing::info!(holder, held, "initial entitlement sync applied");
        Ok(held)
    }

    /// Drops records that are no longer usable. Returns how many were dropped.
    pub fn maintain(&mut self, now: Tick) -> usize {
        self.ledger.purge_expired(now)
    }
}
