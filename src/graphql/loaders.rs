use crate::domain::{Category, Ingredient};
use crate::storage::Storage;
use async_graphql::dataloader::{DataLoader, Loader};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// DataLoader for batching category lookups
pub struct CategoryLoader {
    storage: Arc<dyn Storage>,
}

impl CategoryLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<i64> for CategoryLoader {
    type Value = Category;
    type Error = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let categories = self
            .storage
            .get_categories_by_ids(keys)
            .await
            .map_err(|e| e.to_string())?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }
}

/// DataLoader for the ingredients of each category
///
/// Every requested key gets an entry, so a category without ingredients
/// resolves to an empty list rather than a miss.
pub struct CategoryIngredientsLoader {
    storage: Arc<dyn Storage>,
}

impl CategoryIngredientsLoader {
    pub fn new(storage: Arc<dyn Storage>) -> DataLoader<Self> {
        DataLoader::new(Self { storage }, tokio::spawn)
    }
}

#[async_trait]
impl Loader<i64> for CategoryIngredientsLoader {
    type Value = Vec<Ingredient>;
    type Error = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        let ingredients = self
            .storage
            .get_ingredients_by_category_ids(keys)
            .await
            .map_err(|e| e.to_string())?;

        let mut map: HashMap<i64, Vec<Ingredient>> =
            keys.iter().map(|key| (*key, Vec::new())).collect();
        for ingredient in ingredients {
            map.entry(ingredient.category_id).or_default().push(ingredient);
        }

        Ok(map)
    }
}
