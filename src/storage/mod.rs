//! Persistence for categories and ingredients.
//!
//! The GraphQL layer only ever talks to [`Storage`]; the backend is picked at
//! startup (SQLite on disk, or in-memory for development and tests).

pub mod filter;
pub mod in_memory;
pub mod sqlite;

use crate::domain::{Category, Ingredient, NewCategory, NewIngredient};
use crate::error::Result;
use async_trait::async_trait;

pub use filter::{CategoryFilter, IngredientFilter};
pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// A window over an id-ordered listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    /// `None` means "until the end"
    pub limit: Option<usize>,
}

impl Page {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

/// Chooses the page to read once the number of matching rows is known.
pub type PageSelector<'a> = &'a (dyn Fn(usize) -> Result<Page> + Send + Sync);

/// A page of rows together with the total they were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub total: usize,
    pub items: Vec<T>,
}

/// Storage trait for persisting cookbook data
#[async_trait]
pub trait Storage: Send + Sync {
    // Category operations
    async fn create_category(&self, category: NewCategory) -> Result<Category>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    /// Exact name lookup. More than one match is an error.
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn get_categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>>;
    async fn list_categories(&self, filter: &CategoryFilter, page: Page) -> Result<Vec<Category>>;
    async fn count_categories(&self, filter: &CategoryFilter) -> Result<usize>;
    /// Counts and lists against the same snapshot, so the total always
    /// describes the rows returned.
    async fn list_categories_page(
        &self,
        filter: &CategoryFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Category>>;

    // Ingredient operations
    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Ingredient>;
    async fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>>;
    async fn get_ingredients_by_category_ids(&self, category_ids: &[i64]) -> Result<Vec<Ingredient>>;
    async fn list_ingredients(&self, filter: &IngredientFilter, page: Page) -> Result<Vec<Ingredient>>;
    async fn count_ingredients(&self, filter: &IngredientFilter) -> Result<usize>;
    async fn list_ingredients_page(
        &self,
        filter: &IngredientFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Ingredient>>;

    /// Fixture loading: inserts or replaces rows with explicit primary keys.
    /// All or nothing: a failing row leaves the store untouched.
    async fn import_fixture(&self, categories: &[Category], ingredients: &[Ingredient]) -> Result<()>;
}

/// Applies a [`Page`] to an already ordered iterator.
pub(crate) fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    let items = items.skip(page.offset);
    match page.limit {
        Some(limit) => items.take(limit).collect(),
        None => items.collect(),
    }
}
