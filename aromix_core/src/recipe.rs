//! Recipe catalog: six immutable predefined recipes plus a bounded,
//! persisted set of custom recipes.
//!
//! Persistence is fire-and-forget: a failed save is logged and the
//! in-memory mutation stands (see DESIGN.md for the rationale).

use std::sync::OnceLock;

use crate::actuator::{PUMP_COUNT, VALVE_COUNT};
use crate::error::RecipeError;
use crate::message::OdorId;

/// Capacity of the custom recipe set.
pub const MAX_CUSTOM_RECIPES: usize = 10;

/// A named mapping from an odor id to relative actuator ratios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub odor: OdorId,
    pub name: String,
    /// Per-pump base ratios in percent; scaled by command intensity.
    pub pump_ratios: [u8; PUMP_COUNT],
    pub valve_states: [bool; VALVE_COUNT],
    pub mixing_time_ms: u32,
    /// Base fan speed in percent.
    pub fan_speed: u8,
}

fn predefined() -> &'static [Recipe] {
    static TABLE: OnceLock<Vec<Recipe>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Recipe {
                odor: OdorId::COFFEE,
                name: "Coffee".into(),
                pump_ratios: [80, 0, 0, 0, 20],
                valve_states: [true, false, false, false, true],
                mixing_time_ms: 2000,
                fan_speed: 60,
            },
            Recipe {
                odor: OdorId::ALCOHOL,
                name: "Alcohol".into(),
                pump_ratios: [0, 90, 0, 0, 10],
                valve_states: [false, true, false, false, true],
                mixing_time_ms: 1500,
                fan_speed: 70,
            },
            Recipe {
                odor: OdorId::LEMON,
                name: "Lemon".into(),
                pump_ratios: [0, 0, 85, 0, 15],
                valve_states: [false, false, true, false, true],
                mixing_time_ms: 1800,
                fan_speed: 50,
            },
            Recipe {
                odor: OdorId::MINT,
                name: "Mint".into(),
                pump_ratios: [0, 0, 0, 80, 20],
                valve_states: [false, false, false, true, true],
                mixing_time_ms: 2200,
                fan_speed: 65,
            },
            Recipe {
                odor: OdorId::LAVENDER,
                name: "Lavender".into(),
                pump_ratios: [70, 0, 0, 0, 30],
                valve_states: [true, false, false, false, true],
                mixing_time_ms: 2500,
                fan_speed: 55,
            },
            Recipe {
                odor: OdorId::MIXED,
                name: "Mixed".into(),
                pump_ratios: [30, 30, 20, 20, 0],
                valve_states: [true, true, true, true, false],
                mixing_time_ms: 3000,
                fan_speed: 75,
            },
        ]
    })
}

/// Persistent storage collaborator for the custom recipe set.
pub trait RecipeStore {
    fn load(&mut self) -> eyre::Result<Vec<Recipe>>;
    fn save(&mut self, recipes: &[Recipe]) -> eyre::Result<()>;
}

/// TOML-file-backed store; schema and I/O live in `aromix_config`.
pub struct FileRecipeStore {
    path: std::path::PathBuf,
}

impl FileRecipeStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecipeStore for FileRecipeStore {
    fn load(&mut self) -> eyre::Result<Vec<Recipe>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let rows = aromix_config::load_recipes(&self.path)?;
        Ok(rows.iter().map(Recipe::from).collect())
    }

    fn save(&mut self, recipes: &[Recipe]) -> eyre::Result<()> {
        let rows: Vec<aromix_config::RecipeRow> =
            recipes.iter().map(aromix_config::RecipeRow::from).collect();
        aromix_config::save_recipes(&self.path, &rows)
    }
}

pub struct RecipeCatalog {
    custom: Vec<Recipe>,
    store: Box<dyn RecipeStore>,
}

impl core::fmt::Debug for RecipeCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecipeCatalog")
            .field("custom", &self.custom)
            .finish()
    }
}

impl RecipeCatalog {
    /// Load the custom set from the store; an unreadable store leaves the
    /// set empty rather than failing startup. Entries that collide with a
    /// predefined id or a duplicate are discarded with a warning.
    pub fn new(mut store: Box<dyn RecipeStore>) -> Self {
        let mut custom: Vec<Recipe> = Vec::new();
        match store.load() {
            Ok(loaded) => {
                for recipe in loaded {
                    if custom.len() == MAX_CUSTOM_RECIPES {
                        tracing::warn!("stored recipe set exceeds capacity; tail discarded");
                        break;
                    }
                    let id = recipe.odor;
                    if !id.is_known()
                        || id.is_predefined()
                        || custom.iter().any(|r| r.odor == id)
                    {
                        tracing::warn!(odor = id.raw(), "discarding conflicting stored recipe");
                        continue;
                    }
                    custom.push(recipe);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "recipe storage unreadable; starting with empty custom set");
            }
        }
        Self { custom, store }
    }

    /// Look up the recipe for an odor id. Predefined recipes take
    /// precedence and cannot be shadowed by custom entries.
    pub fn get(&self, odor: OdorId) -> Result<&Recipe, RecipeError> {
        predefined()
            .iter()
            .find(|r| r.odor == odor)
            .or_else(|| self.custom.iter().find(|r| r.odor == odor))
            .ok_or(RecipeError::NotFound(odor))
    }

    /// Add a custom recipe. Capacity is checked before uniqueness so a
    /// full set always reports `CapacityExceeded`, matching the original
    /// firmware. Persists on success without rollback on save failure.
    pub fn add_custom(&mut self, recipe: Recipe) -> Result<(), RecipeError> {
        if self.custom.len() >= MAX_CUSTOM_RECIPES {
            return Err(RecipeError::CapacityExceeded);
        }
        if !recipe.odor.is_known() {
            return Err(RecipeError::InvalidOdor(recipe.odor));
        }
        if self.get(recipe.odor).is_ok() {
            return Err(RecipeError::AlreadyExists(recipe.odor));
        }
        self.custom.push(recipe);
        self.persist();
        Ok(())
    }

    /// Upsert: replace an existing custom recipe by odor id, else behave
    /// like `add_custom`.
    pub fn update(&mut self, recipe: Recipe) -> Result<(), RecipeError> {
        if let Some(slot) = self.custom.iter_mut().find(|r| r.odor == recipe.odor) {
            *slot = recipe;
            self.persist();
            return Ok(());
        }
        self.add_custom(recipe)
    }

    /// Remove a custom recipe, preserving the relative order of the rest.
    /// Predefined recipes are never deletable.
    pub fn delete(&mut self, odor: OdorId) -> Result<(), RecipeError> {
        let Some(idx) = self.custom.iter().position(|r| r.odor == odor) else {
            return Err(RecipeError::NotFound(odor));
        };
        // Vec::remove keeps the remaining order (stable compaction).
        self.custom.remove(idx);
        self.persist();
        Ok(())
    }

    /// All recipes, predefined first, then custom in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Recipe> {
        predefined().iter().chain(self.custom.iter())
    }

    pub fn custom_len(&self) -> usize {
        self.custom.len()
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.custom) {
            tracing::warn!(error = %e, "recipe persistence failed; in-memory set retained");
        }
    }
}
