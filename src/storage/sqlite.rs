//! SQLite-backed storage.
//!
//! A single connection guarded by a mutex. Statements are short and never
//! span an `.await`, so the lock is only held for the duration of one query.

use super::filter::escape_like;
use super::{CategoryFilter, IngredientFilter, Listing, Page, PageSelector, Storage};
use crate::domain::{Category, Ingredient, NewCategory, NewIngredient};
use crate::error::{CookbookError, Result};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, error, info};

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_create_categories_and_ingredients",
    include_str!("../../migrations/001_create_categories_and_ingredients.sql"),
)];

const CATEGORY_COLUMNS: &str = "SELECT id, name FROM ingredients_category";
const INGREDIENT_COLUMNS: &str = "SELECT id, name, notes, category_id FROM ingredients_ingredient";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) a database file. Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            e
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let storage = Self::bootstrap(conn)?;

        info!(
            "Opened database {} in {}ms",
            path.display(),
            started_at.elapsed().as_millis()
        );
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations. Safe to call repeatedly.
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let conn = self.conn()?;
        for (name, sql) in MIGRATIONS {
            conn.execute_batch(sql).map_err(|e| {
                error!("Migration {} failed: {}", name, e);
                e
            })?;
            debug!("Applied migration {}", name);
        }
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }
}

/// WHERE clauses and their bind values, built up from a filter.
#[derive(Default)]
struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    fn push(&mut self, clause: impl Into<String>, value: Value) {
        self.clauses.push(clause.into());
        self.values.push(value);
    }

    fn push_like(&mut self, column: &str, pattern: String) {
        self.push(
            format!("{column} LIKE ? ESCAPE '\\'"),
            Value::Text(pattern),
        );
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn into_paged(self, select: &str, page: Page) -> (String, Vec<Value>) {
        let sql = format!("{select}{} ORDER BY id LIMIT ? OFFSET ?", self.where_sql());
        let mut values = self.values;
        values.push(Value::Integer(page.limit.map_or(-1, to_i64)));
        values.push(Value::Integer(to_i64(page.offset)));
        (sql, values)
    }

    fn into_count(self, table: &str) -> (String, Vec<Value>) {
        let sql = format!("SELECT COUNT(*) FROM {table}{}", self.where_sql());
        (sql, self.values)
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn category_filter(filter: &CategoryFilter) -> SqlFilter {
    let mut sql = SqlFilter::default();
    if let Some(name) = &filter.name {
        sql.push("name = ?", Value::Text(name.clone()));
    }
    if !filter.ingredient_ids.is_empty() {
        sql.clauses.push(format!(
            "id IN (SELECT category_id FROM ingredients_ingredient WHERE id IN ({}))",
            placeholders(filter.ingredient_ids.len())
        ));
        sql.values
            .extend(filter.ingredient_ids.iter().map(|id| Value::Integer(*id)));
    }
    sql
}

fn ingredient_filter(filter: &IngredientFilter) -> SqlFilter {
    let mut sql = SqlFilter::default();
    if let Some(name) = &filter.name {
        sql.push("name = ?", Value::Text(name.clone()));
    }
    if let Some(needle) = &filter.name_icontains {
        sql.push_like("name", format!("%{}%", escape_like(needle)));
    }
    if let Some(prefix) = &filter.name_istartswith {
        sql.push_like("name", format!("{}%", escape_like(prefix)));
    }
    if let Some(notes) = &filter.notes {
        sql.push("notes = ?", Value::Text(notes.clone()));
    }
    if let Some(needle) = &filter.notes_icontains {
        sql.push_like("notes", format!("%{}%", escape_like(needle)));
    }
    if let Some(category_id) = filter.category_id {
        sql.push("category_id = ?", Value::Integer(category_id));
    }
    if let Some(category_name) = &filter.category_name {
        sql.push(
            "category_id IN (SELECT id FROM ingredients_category WHERE name = ?)",
            Value::Text(category_name.clone()),
        );
    }
    sql
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        notes: row.get(2)?,
        category_id: row.get(3)?,
    })
}

/// Constraint violations become integrity errors; everything else stays a database error.
fn write_error(err: rusqlite::Error) -> CookbookError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            CookbookError::Integrity(
                message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string()),
            )
        }
        _ => CookbookError::Database(err),
    }
}

fn query_categories(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values), category_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_ingredients(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values), ingredient_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn upsert_category(conn: &Connection, category: &Category) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO ingredients_category (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name",
        params![category.id, category.name],
    )
}

fn upsert_ingredient(conn: &Connection, ingredient: &Ingredient) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO ingredients_ingredient (id, name, notes, category_id) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            name=excluded.name, notes=excluded.notes, category_id=excluded.category_id",
        params![
            ingredient.id,
            ingredient.name,
            ingredient.notes,
            ingredient.category_id
        ],
    )
}

fn query_count(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<usize> {
    let count: i64 = conn.query_row(sql, params_from_iter(values), |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ingredients_category (name) VALUES (?1)",
            params![category.name],
        )
        .map_err(write_error)?;
        let created = Category {
            id: conn.last_insert_rowid(),
            name: category.name,
        };

        debug!("Created category: {} with id {}", created.name, created.id);
        Ok(created)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!("{CATEGORY_COLUMNS} WHERE id = ?1"),
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let mut matches = query_categories(
            &conn,
            &format!("{CATEGORY_COLUMNS} WHERE name = ? ORDER BY id"),
            vec![Value::Text(name.to_string())],
        )?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            count => Err(CookbookError::MultipleObjectsReturned {
                entity: "Category",
                count,
            }),
        }
    }

    async fn get_categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        query_categories(
            &conn,
            &format!("{CATEGORY_COLUMNS} WHERE id IN ({}) ORDER BY id", placeholders(ids.len())),
            ids.iter().map(|id| Value::Integer(*id)).collect(),
        )
    }

    async fn list_categories(&self, filter: &CategoryFilter, page: Page) -> Result<Vec<Category>> {
        let (sql, values) = category_filter(filter).into_paged(CATEGORY_COLUMNS, page);
        let conn = self.conn()?;
        query_categories(&conn, &sql, values)
    }

    async fn count_categories(&self, filter: &CategoryFilter) -> Result<usize> {
        let (sql, values) = category_filter(filter).into_count("ingredients_category");
        let conn = self.conn()?;
        query_count(&conn, &sql, values)
    }

    async fn list_categories_page(
        &self,
        filter: &CategoryFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Category>> {
        let conn = self.conn()?;
        let (sql, values) = category_filter(filter).into_count("ingredients_category");
        let total = query_count(&conn, &sql, values)?;
        let (sql, values) = category_filter(filter).into_paged(CATEGORY_COLUMNS, select(total)?);
        let items = query_categories(&conn, &sql, values)?;
        Ok(Listing { total, items })
    }

    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<Ingredient> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ingredients_ingredient (name, notes, category_id) VALUES (?1, ?2, ?3)",
            params![ingredient.name, ingredient.notes, ingredient.category_id],
        )
        .map_err(write_error)?;
        let created = Ingredient {
            id: conn.last_insert_rowid(),
            name: ingredient.name,
            notes: ingredient.notes,
            category_id: ingredient.category_id,
        };

        debug!("Created ingredient: {} with id {}", created.name, created.id);
        Ok(created)
    }

    async fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        let conn = self.conn()?;
        let ingredient = conn
            .query_row(
                &format!("{INGREDIENT_COLUMNS} WHERE id = ?1"),
                params![id],
                ingredient_from_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    async fn get_ingredients_by_category_ids(&self, category_ids: &[i64]) -> Result<Vec<Ingredient>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        query_ingredients(
            &conn,
            &format!(
                "{INGREDIENT_COLUMNS} WHERE category_id IN ({}) ORDER BY id",
                placeholders(category_ids.len())
            ),
            category_ids.iter().map(|id| Value::Integer(*id)).collect(),
        )
    }

    async fn list_ingredients(&self, filter: &IngredientFilter, page: Page) -> Result<Vec<Ingredient>> {
        let (sql, values) = ingredient_filter(filter).into_paged(INGREDIENT_COLUMNS, page);
        let conn = self.conn()?;
        query_ingredients(&conn, &sql, values)
    }

    async fn count_ingredients(&self, filter: &IngredientFilter) -> Result<usize> {
        let (sql, values) = ingredient_filter(filter).into_count("ingredients_ingredient");
        let conn = self.conn()?;
        query_count(&conn, &sql, values)
    }

    async fn list_ingredients_page(
        &self,
        filter: &IngredientFilter,
        select: PageSelector<'_>,
    ) -> Result<Listing<Ingredient>> {
        let conn = self.conn()?;
        let (sql, values) = ingredient_filter(filter).into_count("ingredients_ingredient");
        let total = query_count(&conn, &sql, values)?;
        let (sql, values) = ingredient_filter(filter).into_paged(INGREDIENT_COLUMNS, select(total)?);
        let items = query_ingredients(&conn, &sql, values)?;
        Ok(Listing { total, items })
    }

    async fn import_fixture(&self, categories: &[Category], ingredients: &[Ingredient]) -> Result<()> {
        let mut conn = self.conn()?;
        // Dropping the transaction without commit rolls everything back
        let tx = conn.transaction()?;
        for category in categories {
            upsert_category(&tx, category).map_err(write_error)?;
        }
        for ingredient in ingredients {
            upsert_ingredient(&tx, ingredient).map_err(write_error)?;
        }
        tx.commit()?;

        debug!(
            "Imported {} categories and {} ingredients",
            categories.len(),
            ingredients.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn migrated() -> SqliteStorage {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.run_migrations().unwrap();
        storage
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let storage = migrated();
        storage.run_migrations().unwrap();
        assert_eq!(
            storage.count_categories(&CategoryFilter::default()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_foreign_key_violation_is_integrity_error() {
        let storage = migrated();
        let err = storage
            .create_ingredient(NewIngredient::new("Eggs", "Good old eggs", 42))
            .await
            .unwrap_err();
        assert!(matches!(err, CookbookError::Integrity(_)), "got {err:?}");
        assert_eq!(
            storage.count_ingredients(&IngredientFilter::default()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let storage = migrated();
        let dairy = storage.create_category(NewCategory::new("Dairy")).await.unwrap();
        storage
            .create_ingredient(NewIngredient::new("50% Cream", "rich", dairy.id))
            .await
            .unwrap();
        storage
            .create_ingredient(NewIngredient::new("500g Butter", "salted", dairy.id))
            .await
            .unwrap();

        let filter = IngredientFilter {
            name_icontains: Some("0%".to_string()),
            ..Default::default()
        };
        let found = storage.list_ingredients(&filter, Page::all()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "50% Cream");

        let filter = IngredientFilter {
            name_istartswith: Some("500G".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_ingredients(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_name_and_ingredient_filters() {
        let storage = migrated();
        let dairy = storage.create_category(NewCategory::new("Dairy")).await.unwrap();
        let meat = storage.create_category(NewCategory::new("Meat")).await.unwrap();
        storage
            .create_ingredient(NewIngredient::new("Milk", "Comes from a cow", dairy.id))
            .await
            .unwrap();
        let beef = storage
            .create_ingredient(NewIngredient::new("Beef", "Also from a cow", meat.id))
            .await
            .unwrap();

        let filter = IngredientFilter {
            category_name: Some("Meat".to_string()),
            notes_icontains: Some("cow".to_string()),
            ..Default::default()
        };
        let found = storage.list_ingredients(&filter, Page::all()).await.unwrap();
        assert_eq!(found, vec![beef.clone()]);

        let filter = CategoryFilter {
            ingredient_ids: vec![beef.id],
            ..Default::default()
        };
        let categories = storage.list_categories(&filter, Page::all()).await.unwrap();
        assert_eq!(categories, vec![meat]);
    }

    #[tokio::test]
    async fn test_pages_follow_id_order() {
        let storage = migrated();
        for name in ["A", "B", "C", "D"] {
            storage.create_category(NewCategory::new(name)).await.unwrap();
        }
        let page = storage
            .list_categories(&CategoryFilter::default(), Page::new(1, 2))
            .await
            .unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);

        let tail = storage
            .list_categories(
                &CategoryFilter::default(),
                Page {
                    offset: 3,
                    limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_reported() {
        let storage = migrated();
        storage.create_category(NewCategory::new("Dairy")).await.unwrap();
        storage.create_category(NewCategory::new("Dairy")).await.unwrap();
        let err = storage.get_category_by_name("Dairy").await.unwrap_err();
        assert!(matches!(
            err,
            CookbookError::MultipleObjectsReturned { count: 2, .. }
        ));
        assert!(storage.get_category_by_name("Produce").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_upserts_and_new_rows_follow() {
        let storage = migrated();
        let dairy = |name: &str| Category {
            id: 5,
            name: name.to_string(),
        };
        storage.import_fixture(&[dairy("Dairy")], &[]).await.unwrap();
        storage.import_fixture(&[dairy("Dairy & Eggs")], &[]).await.unwrap();
        let created = storage.create_category(NewCategory::new("Meat")).await.unwrap();

        assert_eq!(created.id, 6);
        let imported = storage.get_category(5).await.unwrap().unwrap();
        assert_eq!(imported.name, "Dairy & Eggs");
    }

    #[tokio::test]
    async fn test_failed_import_rolls_back() {
        let storage = migrated();
        let categories = [Category {
            id: 1,
            name: "Dairy".to_string(),
        }];
        let ingredients = [Ingredient {
            id: 1,
            name: "Tofu".to_string(),
            notes: "Soy".to_string(),
            category_id: 99,
        }];

        let err = storage
            .import_fixture(&categories, &ingredients)
            .await
            .unwrap_err();
        assert!(matches!(err, CookbookError::Integrity(_)), "got {err:?}");
        assert_eq!(
            storage.count_categories(&CategoryFilter::default()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_page_listing_reports_total() {
        let storage = migrated();
        for name in ["A", "B", "C"] {
            storage.create_category(NewCategory::new(name)).await.unwrap();
        }
        let listing = storage
            .list_categories_page(&CategoryFilter::default(), &|total| {
                Ok(Page::new(1, total))
            })
            .await
            .unwrap();
        assert_eq!(listing.total, 3);
        assert_eq!(listing.items.len(), 2);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("cookbook.db");
        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.run_migrations().unwrap();
            storage.create_category(NewCategory::new("Dairy")).await.unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        storage.run_migrations().unwrap();
        let found = storage.get_category_by_name("Dairy").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(1));
    }
}
