//! Loading of JSON fixtures in the `dumpdata` layout:
//!
//! ```json
//! [{"model": "ingredients.category", "pk": 1, "fields": {"name": "Dairy"}}]
//! ```

use crate::domain::{Category, Ingredient};
use crate::error::{CookbookError, Result};
use crate::observability::metrics;
use crate::storage::Storage;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const CATEGORY_MODEL: &str = "ingredients.category";
pub const INGREDIENT_MODEL: &str = "ingredients.ingredient";

#[derive(Debug, Deserialize)]
struct FixtureRecord {
    model: String,
    pk: i64,
    fields: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CategoryFields {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IngredientFields {
    name: String,
    #[serde(default)]
    notes: String,
    category: i64,
}

/// Parsed fixture contents, ready to import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Fixture {
    pub categories: Vec<Category>,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub categories: usize,
    pub ingredients: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.categories + self.ingredients
    }
}

impl Fixture {
    pub fn from_json(content: &str) -> Result<Self> {
        let records: Vec<FixtureRecord> = serde_json::from_str(content)?;
        let mut fixture = Fixture::default();

        for record in records {
            match record.model.as_str() {
                CATEGORY_MODEL => {
                    let fields: CategoryFields = serde_json::from_value(record.fields)?;
                    fixture.categories.push(Category {
                        id: record.pk,
                        name: fields.name,
                    });
                }
                INGREDIENT_MODEL => {
                    let fields: IngredientFields = serde_json::from_value(record.fields)?;
                    fixture.ingredients.push(Ingredient {
                        id: record.pk,
                        name: fields.name,
                        notes: fields.notes,
                        category_id: fields.category,
                    });
                }
                other => {
                    return Err(CookbookError::Fixture(format!(
                        "Unknown model '{other}' (pk {})",
                        record.pk
                    )))
                }
            }
        }

        Ok(fixture)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Imports every record or none of them. Categories go first so
    /// ingredient foreign keys resolve regardless of file order.
    pub async fn load_into(self, storage: &dyn Storage) -> Result<LoadSummary> {
        let summary = LoadSummary {
            categories: self.categories.len(),
            ingredients: self.ingredients.len(),
        };

        storage
            .import_fixture(&self.categories, &self.ingredients)
            .await?;

        metrics::catalog::record_fixture_objects(summary.total());
        info!(
            "Installed {} object(s) ({} categories, {} ingredients)",
            summary.total(),
            summary.categories,
            summary.ingredients
        );
        Ok(summary)
    }
}
