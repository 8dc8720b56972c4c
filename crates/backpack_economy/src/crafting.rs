//! # Crafting Engine
//!
//! **Transactional recipe execution against the ledger**
//!
//! 1. **Sufficient amounts**: every requirement is checked as
//!    `usable amount >= required`, summed per item
//! 2. **Transactional**: either all inputs are consumed and the output is
//!    created, or the ledger is left exactly as it was
//! 3. **No Duplication**: outputs only come from consumed inputs
//!
//! ## Example
//!
//! ```rust,ignore
//! let engine = CraftingEngine::new(ItemCatalog::standard(), DEFAULT_CRAFT_TTL);
//! let potion = engine.craft(&mut ledger, "alice", HEALTH_POTION_RECIPE, now)?;
//! ```

use crate::catalog::{ItemCatalog, Recipe, RecipeId};
use crate::config::LedgerConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::ledger::Ledger;
use crate::record::{EntitlementRecord, Tick};

/// Executes catalog recipes against a ledger.
#[derive(Clone, Debug)]
pub struct CraftingEngine {
    catalog: ItemCatalog,
    /// Ticks a crafted output stays usable.
    output_ttl: Tick,
}

impl CraftingEngine {
    /// Creates an engine over `catalog` producing outputs that live `output_ttl` ticks.
    #[must_use]
    pub const fn new(catalog: ItemCatalog, output_ttl: Tick) -> Self {
        Self {
            catalog,
            output_ttl,
        }
    }

    /// Creates an engine using the configured craft TTL.
    #[must_use]
    pub fn from_config(catalog: ItemCatalog, config: &LedgerConfig) -> Self {
        Self::new(catalog, config.craft_ttl)
    }

    /// The catalog recipes are drawn from.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Ticks a crafted output stays usable.
    #[inline]
    #[must_use]
    pub const fn output_ttl(&self) -> Tick {
        self.output_ttl
    }

    /// Checks whether `user` can craft a recipe right now.
    ///
    /// # Errors
    ///
    /// - `RecipeNotFound` if the recipe doesn't exist
    /// - `MissingIngredients` naming the first item that falls short
    pub fn can_craft(
        &self,
        ledger: &Ledger,
        user: &str,
        recipe_id: RecipeId,
        now: Tick,
    ) -> EconomyResult<()> {
        let recipe = self.recipe(recipe_id)?;
        check_ingredients(ledger, user, recipe, now)
    }

    /// Performs a transactional craft.
    ///
    /// **ATOMIC**: either every input unit is consumed and the output is
    /// created, or nothing happens.
    ///
    /// Returns `user`'s record for the output item after the craft.
    ///
    /// # Errors
    ///
    /// - `RecipeNotFound` if the recipe doesn't exist
    /// - `MissingIngredients` if any requirement is short
    /// - `CapacityExceeded` if the output needs a slot the ledger doesn't have
    pub fn craft(
        &self,
        ledger: &mut Ledger,
        user: &str,
        recipe_id: RecipeId,
        now: Tick,
    ) -> EconomyResult<EntitlementRecord> {
        let recipe = self.recipe(recipe_id)?;
        check_ingredients(ledger, user, recipe, now)?;

        // Take snapshot for rollback
        let snapshot = ledger.snapshot();

        for (&item_id, &required) in &recipe.requirements() {
            for _ in 0..required {
                if !ledger.consume(user, item_id, now) {
                    ledger.restore(&snapshot);
                    return Err(EconomyError::MissingIngredients {
                        item_id,
                        required,
                        available: 0,
                    });
                }
            }
        }

        let output = recipe.output;
        if let Err(e) = ledger.create(user, output.item_id, output.quantity, self.output_ttl, now) {
            ledger.restore(&snapshot);
            return Err(e);
        }

        let record = ledger
            .get(user, output.item_id)
            .cloned()
            .ok_or_else(|| EconomyError::NotFound {
                item_id: output.item_id,
                user: user.to_string(),
            })?;

        tracing::info!(
            user,
            recipe_id,
            recipe = %recipe.name,
            output = output.item_id,
            "item crafted"
        );
        Ok(record)
    }

    fn recipe(&self, recipe_id: RecipeId) -> EconomyResult<&Recipe> {
        self.catalog
            .recipe(recipe_id)
            .ok_or(EconomyError::RecipeNotFound(recipe_id))
    }
}

fn check_ingredients(ledger: &Ledger, user: &str, recipe: &Recipe, now: Tick) -> EconomyResult<()> {
    for (item_id, required) in recipe.requirements() {
        let available = ledger.amount(user, item_id, now);
        if available < required {
            return Err(EconomyError::MissingIngredients {
                item_id,
                required,
                available,
            });
        }
    }
    Ok(())
}
