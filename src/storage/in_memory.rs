use super::{paginate, CategoryFilter, IngredientFilter, Listing, Page, PageSelector, Storage};
use crate::domain::{Category, Ingredient, NewCategory, NewIngredient};
use crate::error::{CookbookError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    ingredients: BTreeMap<i64, Ingredient>,
}

impl Tables {
    fn next_category_id(&self) -> i64 {
        self.categories.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_ingredient_id(&self) -> i64 {
        self.ingredients.keys().next_back().map_or(1, |id| id + 1)
    }

    fn filtered_categories<'a>(
        &'a self,
        filter: &'a CategoryFilter,
    ) -> impl Iterator<Item = &'a Category> + 'a {
        let ingredients: Vec<Ingredient> = if filter.ingredient_ids.is_empty() {
            Vec::new()
        } else {
            self.ingredients.values().cloned().collect()
        };
        self.categories
            .values()
            .filter(move |c| filter.matches(c, &ingredients))
    }

    fn filtered_ingredients<'a>(
        &'a self,
        filter: &'a IngredientFilter,
    ) -> impl Iterator<Item = &'a Ingredient> + 'a {
        self.ingredients
            .values()
            .filter(move |i| filter.matches(i, self.categories.get(&i.category_id)))
    }
}

/// In-memory storage implementation for development/testing
///
/// Ids are handed out like an autoincrement column: one past the highest id
/// currently stored.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        Ok(self.tables.lock()?)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let mut tables = self.tables()?;
        let created = Category {
            id: tables.next_category_id(),
            name: category.name,
        };
        tables.categories.insert(created.id, created.clone());

        debug!("Created category: {} with id {}", created.name, created.id);
        Ok(created)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables()?.categories.get(&id).cloned())
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let tables = self.tables()?;
        let mut matches: Vec<&Category> = tables
            .categories
            .values()
            .filter(|c| c.name == name)
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop().cloned()),
            count => Err(CookbookError::MultipleObjectsReturned {
                entity: "Category",
                count,
            }),
        }
    }

    async fn get_categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>> {
        let tables = self.tables()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.categories.get(id).cloned())
            .collect())
    }

    async fn list_categories(&self, filter: &CategoryFilter, page: Page) -> Result<Vec<Category>> {
        let tables = self.tables()?;
        Ok(paginate(tables.filtered_categories(filter).cloned(), page))
    }

    async fn count_categories(&self, filter: &CategoryFilter) -> Result<usize> {
        Ok(self.tables()?.filtered_categories(filter).count())
    }

    async fn list_categories_page(
        &self,
        filter: &CategoryFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Category>> {
        let tables = self.tables()?;
        let total = tables.filtered_categories(filter).count();
        let items = paginate(tables.filtered_categories(filter).cloned(), select(total)?);
        Ok(Listing { total, items })
    }

    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Ingredient> {
        let mut tables = self.tables()?;
        if !tables.categories.contains_key(&ingredient.category_id) {
            return Err(CookbookError::Integrity(format!(
                "category {} does not exist",
                ingredient.category_id
            )));
        }
        let created = Ingredient {
            id: tables.next_ingredient_id(),
            name: ingredient.name,
            notes: ingredient.notes,
            category_id: ingredient.category_id,
        };
        tables.ingredients.insert(created.id, created.clone());

        debug!("Created ingredient: {} with id {}", created.name, created.id);
        Ok(created)
    }

    async fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        Ok(self.tables()?.ingredients.get(&id).cloned())
    }

    async fn get_ingredients_by_category_ids(&self, category_ids: &[i64]) -> Result<Vec<Ingredient>> {
        let tables = self.tables()?;
        Ok(tables
            .ingredients
            .values()
            .filter(|i| category_ids.contains(&i.category_id))
            .cloned()
            .collect())
    }

    async fn list_ingredients(&self, filter: &IngredientFilter, page: Page) -> Result<Vec<Ingredient>> {
        let tables = self.tables()?;
        Ok(paginate(tables.filtered_ingredients(filter).cloned(), page))
    }

    async fn count_ingredients(&self, filter: &IngredientFilter) -> Result<usize> {
        Ok(self.tables()?.filtered_ingredients(filter).count())
    }

    async fn list_ingredients_page(
        &self,
        filter: &IngredientFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Ingredient>> {
        let tables = self.tables()?;
        let total = tables.filtered_ingredients(filter).count();
        let items = paginate(tables.filtered_ingredients(filter).cloned(), select(total)?);
        Ok(Listing { total, items })
    }

    async fn import_fixture(&self, categories: &[Category], ingredients: &[Ingredient]) -> Result<()> {
        let mut tables = self.tables()?;

        // Validate every row before touching the maps
        let known: BTreeSet<i64> = tables
            .categories
            .keys()
            .copied()
            .chain(categories.iter().map(|c| c.id))
            .collect();
        if let Some(orphan) = ingredients.iter().find(|i| !known.contains(&i.category_id)) {
            return Err(CookbookError::Integrity(format!(
                "ingredient {} references missing category {}",
                orphan.id, orphan.category_id
            )));
        }

        for category in categories {
            tables.categories.insert(category.id, category.clone());
        }
        for ingredient in ingredients {
            tables.ingredients.insert(ingredient.id, ingredient.clone());
        }
        debug!(
            "Imported {} categories and {} ingredients",
            categories.len(),
            ingredients.len()
        );
        Ok(())
    }
}
