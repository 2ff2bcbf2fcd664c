//! Domain data shapes shared by storage and both GraphQL schemas.

use serde::{Deserialize, Serialize};

/// A grouping of ingredients, e.g. "Dairy" or "Meat".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A single ingredient. Always belongs to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub notes: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub notes: String,
    pub category_id: i64,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl NewIngredient {
    pub fn new(name: impl Into<String>, notes: impl Into<String>, category_id: i64) -> Self {
        Self {
            name: name.into(),
            notes: notes.into(),
            category_id,
        }
    }
}
