//! # Item Catalog
//!
//! Static mapping from item identifier to display name, plus the crafting
//! recipes that turn held entitlements into new ones.
//!
//! The catalog is built once at session start, either from the standard
//! item set or from a TOML definition:
//!
//! ```toml
//! [[items]]
//! id = 3
//! name = "Herb"
//!
//! [[items]]
//! id = 5
//! name = "Health Potion"
//!
//! [[recipes]]
//! id = 1
//! name = "Health Potion"
//! inputs = [{ item_id = 3, quantity = 2 }]
//! output = { item_id = 5, quantity = 1 }
//! ```
//!
//! Loading validates the recipe graph: every referenced item must exist and
//! no item may be craftable back into itself.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::{EconomyError, EconomyResult};

/// Unique identifier for an item type (the on-chain token id).
pub type ItemId = u32;

/// Unique identifier for a recipe.
pub type RecipeId = u32;

/// Chainsaw enhancement.
pub const SWORD: ItemId = 1;
/// Shotgun enhancement.
pub const SHIELD: ItemId = 2;
/// Health enhancement.
pub const HERB: ItemId = 3;
/// Power-up enhancement.
pub const POTION: ItemId = 4;
/// Crafted from two herbs.
pub const HEALTH_POTION: ItemId = 5;
/// Crafted from a shield and a potion.
pub const ARMOR: ItemId = 6;
/// Crafted from a sword and a potion.
pub const SUPER_SHOTGUN: ItemId = 7;

/// Recipe id of the standard health potion recipe.
pub const HEALTH_POTION_RECIPE: RecipeId = 1;
/// Recipe id of the standard armor recipe.
pub const ARMOR_RECIPE: RecipeId = 2;
/// Recipe id of the standard super shotgun recipe.
pub const SUPER_SHOTGUN_RECIPE: RecipeId = 3;

/// Display name for ids the catalog doesn't know.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";

/// Input or output item in a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    /// The item ID.
    pub item_id: ItemId,
    /// Quantity required/produced.
    pub quantity: u32,
}

impl RecipeItem {
    /// Creates a new recipe item.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// A crafting recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier.
    pub id: RecipeId,
    /// Human-readable name.
    pub name: String,
    /// Items consumed by this recipe, in menu order.
    pub inputs: Vec<RecipeItem>,
    /// The single item produced.
    pub output: RecipeItem,
}

impl Recipe {
    /// Creates a new recipe with basic validation.
    ///
    /// # Errors
    ///
    /// Returns error if the recipe has no inputs or any zero quantity.
    pub fn new(
        id: RecipeId,
        name: impl Into<String>,
        inputs: Vec<RecipeItem>,
        output: RecipeItem,
    ) -> EconomyResult<Self> {
        let recipe = Self {
            id,
            name: name.into(),
            inputs,
            output,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    fn validate(&self) -> EconomyResult<()> {
        if self.inputs.is_empty() {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe {} must have at least one input",
                self.id
            )));
        }
        if self.output.quantity == 0 || self.inputs.iter().any(|i| i.quantity == 0) {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe {} has a zero quantity",
                self.id
            )));
        }
        Ok(())
    }

    /// Total units required per item, summing repeated inputs.
    ///
    /// A recipe listing "Herb + Herb" requires two herbs.
    #[must_use]
    pub fn requirements(&self) -> BTreeMap<ItemId, u32> {
        let mut totals = BTreeMap::new();
        for input in &self.inputs {
            let entry = totals.entry(input.item_id).or_insert(0u32);
            *entry = entry.saturating_add(input.quantity);
        }
        totals
    }
}

/// An item definition as it appears in catalog TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Token id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
}

/// On-disk catalog layout.
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// Item names and recipes, immutable once built.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    names: HashMap<ItemId, String>,
    recipes: BTreeMap<RecipeId, Recipe>,
}

impl ItemCatalog {
    /// The standard item set: four drop items and three crafted ones.
    #[must_use]
    pub fn standard() -> Self {
        let names = [
            (SWORD, "Sword"),
            (SHIELD, "Shield"),
            (HERB, "Herb"),
            (POTION, "Potion"),
            (HEALTH_POTION, "Health Potion"),
            (ARMOR, "Armor"),
            (SUPER_SHOTGUN, "Super Shotgun"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

        let recipes = [
            Recipe {
                id: HEALTH_POTION_RECIPE,
                name: "Health Potion".to_string(),
                inputs: vec![RecipeItem::new(HERB, 1), RecipeItem::new(HERB, 1)],
                output: RecipeItem::new(HEALTH_POTION, 1),
            },
            Recipe {
                id: ARMOR_RECIPE,
                name: "Armor".to_string(),
                inputs: vec![RecipeItem::new(SHIELD, 1), RecipeItem::new(POTION, 1)],
                output: RecipeItem::new(ARMOR, 1),
            },
            Recipe {
                id: SUPER_SHOTGUN_RECIPE,
                name: "Super Shotgun".to_string(),
                inputs: vec![RecipeItem::new(SWORD, 1), RecipeItem::new(POTION, 1)],
                output: RecipeItem::new(SUPER_SHOTGUN, 1),
            },
        ]
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

        Self { names, recipes }
    }

    /// Builds a catalog from item definitions and recipes.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on duplicate ids, unknown item references, zero
    /// quantities or a cyclic recipe graph.
    pub fn from_parts(items: Vec<ItemDef>, recipes: Vec<Recipe>) -> EconomyResult<Self> {
        let mut catalog = Self::default();

        for item in items {
            if catalog.names.insert(item.id, item.name).is_some() {
                return Err(EconomyError::InvalidConfig(format!(
                    "item id {} defined twice",
                    item.id
                )));
            }
        }

        for recipe in recipes {
            recipe.validate()?;
            let referenced = recipe
                .inputs
                .iter()
                .chain(std::iter::once(&recipe.output));
            for entry in referenced {
                if !catalog.contains_item(entry.item_id) {
                    return Err(EconomyError::InvalidConfig(format!(
                        "recipe {} references unknown item {}",
                        recipe.id, entry.item_id
                    )));
                }
            }
            if catalog.recipes.contains_key(&recipe.id) {
                return Err(EconomyError::InvalidConfig(format!(
                    "recipe id {} defined twice",
                    recipe.id
                )));
            }
            catalog.recipes.insert(recipe.id, recipe);
        }

        if !catalog.is_acyclic() {
            return Err(EconomyError::InvalidConfig(
                "recipe graph contains a cycle".to_string(),
            ));
        }

        Ok(catalog)
    }

    /// Parses a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the text doesn't parse or fails validation.
    pub fn from_toml_str(text: &str) -> EconomyResult<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| EconomyError::InvalidConfig(e.to_string()))?;
        Self::from_parts(file.items, file.recipes)
    }

    /// Display name of an item, or [`UNKNOWN_ITEM_NAME`].
    #[must_use]
    pub fn item_name(&self, item_id: ItemId) -> &str {
        self.names
            .get(&item_id)
            .map_or(UNKNOWN_ITEM_NAME, String::as_str)
    }

    /// Whether the catalog defines this item.
    #[inline]
    #[must_use]
    pub fn contains_item(&self, item_id: ItemId) -> bool {
        self.names.contains_key(&item_id)
    }

    /// Gets a recipe by ID.
    #[must_use]
    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// All recipes in id order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Returns the number of recipes.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Kahn's algorithm over items: an edge runs from every input of a
    /// recipe to its output. A full topological order means no cycle.
    fn is_acyclic(&self) -> bool {
        let mut in_degree: HashMap<ItemId, usize> = HashMap::new();
        let mut adjacency: HashMap<ItemId, Vec<ItemId>> = HashMap::new();

        for recipe in self.recipes.values() {
            in_degree.entry(recipe.output.item_id).or_insert(0);
            for &input in recipe.requirements().keys() {
                in_degree.entry(input).or_insert(0);
                adjacency
                    .entry(input)
                    .or_default()
                    .push(recipe.output.item_id);
                *in_degree.entry(recipe.output.item_id).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<ItemId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut sorted_count = 0;
        while let Some(item) = queue.pop_front() {
            sorted_count += 1;
            if let Some(next) = adjacency.get(&item) {
                for target in next {
                    if let Some(deg) = in_degree.get_mut(target) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(*target);
                        }
                    }
                }
            }
        }

        sorted_count == in_degree.len()
    }
}
