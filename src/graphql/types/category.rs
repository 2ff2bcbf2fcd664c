use crate::domain::Category;
use crate::graphql::relay::{to_global_id, ArrayCursor};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::IngredientType;
use async_graphql::connection::{Connection, ConnectionNameType, EdgeNameType, EmptyFields};
use async_graphql::{Context, FieldResult, Interface, Object, OutputType, SimpleObject, ID};

/// GraphQL representation of a Category
#[derive(Clone)]
pub struct CategoryType {
    pub inner: Category,
}

impl From<Category> for CategoryType {
    fn from(category: Category) -> Self {
        Self { inner: category }
    }
}

#[Object]
impl CategoryType {
    /// The primary key of the category
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// The name of the category
    async fn name(&self) -> &str {
        &self.inner.name
    }

    /// Ingredients filed under this category
    async fn ingredients(&self, ctx: &Context<'_>) -> FieldResult<Vec<IngredientType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let ingredients = context
            .ingredients_loader
            .load_one(self.inner.id)
            .await?
            .unwrap_or_default();

        Ok(ingredients.into_iter().map(|i| i.into()).collect())
    }
}

/// A category as it appears in the `categories` connection.
#[derive(Clone)]
pub struct CategorySummary {
    pub inner: Category,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self { inner: category }
    }
}

#[Object(name = "CategoryNode")]
impl CategorySummary {
    /// The ID of the object
    async fn id(&self) -> ID {
        to_global_id("CategoryNode", self.inner.id)
    }

    async fn category_name(&self) -> Option<&str> {
        Some(&self.inner.name)
    }
}

/// The Relay `Node` interface as exposed by the cookbook schema.
#[derive(Interface)]
#[graphql(name = "Node", field(name = "id", ty = "ID"))]
pub enum CookbookNode {
    CategorySummary(CategorySummary),
}

#[derive(SimpleObject)]
pub struct CategoryConnectionFields {
    /// Number of categories in the database, independent of the page requested
    pub total_count: usize,
}

pub struct CategoryConnectionName;

impl ConnectionNameType for CategoryConnectionName {
    fn type_name<T: OutputType>() -> String {
        "CategoryConnection".to_string()
    }
}

pub struct CategoryEdgeName;

impl EdgeNameType for CategoryEdgeName {
    fn type_name<T: OutputType>() -> String {
        "CategoryEdge".to_string()
    }
}

pub type CategoryConnection = Connection<
    ArrayCursor,
    CategorySummary,
    CategoryConnectionFields,
    EmptyFields,
    CategoryConnectionName,
    CategoryEdgeName,
>;
