//! Relay node types for the ingredients schema.

use crate::domain::{Category, Ingredient};
use crate::graphql::relay::{to_global_id, ArrayCursor, ConnectionArgs};
use crate::graphql::resolvers::relay_query::{ingredient_connection, IngredientFilterArgs};
use crate::graphql::schema::GraphQLContext;
use async_graphql::connection::Connection;
use async_graphql::{Context, FieldResult, Interface, Object, ID};

pub const CATEGORY_NODE: &str = "CategoryNode";
pub const INGREDIENT_NODE: &str = "IngredientNode";

pub type CategoryNodeConnection = Connection<ArrayCursor, CategoryNode>;
pub type IngredientNodeConnection = Connection<ArrayCursor, IngredientNode>;

/// An object with an ID
#[derive(Interface)]
#[graphql(field(name = "id", ty = "ID"))]
pub enum Node {
    CategoryNode(CategoryNode),
    IngredientNode(IngredientNode),
}

#[derive(Clone)]
pub struct CategoryNode {
    pub inner: Category,
}

impl From<Category> for CategoryNode {
    fn from(category: Category) -> Self {
        Self { inner: category }
    }
}

#[Object]
impl CategoryNode {
    /// The ID of the object
    async fn id(&self) -> ID {
        to_global_id(CATEGORY_NODE, self.inner.id)
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    /// Ingredients of this category, filterable like `allIngredients`
    #[allow(clippy::too_many_arguments)]
    async fn ingredients(
        &self,
        ctx: &Context<'_>,
        offset: Option<i32>,
        before: Option<String>,
        after: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        name: Option<String>,
        #[graphql(name = "name_Icontains")] name_icontains: Option<String>,
        #[graphql(name = "name_Istartswith")] name_istartswith: Option<String>,
        notes: Option<String>,
        #[graphql(name = "notes_Icontains")] notes_icontains: Option<String>,
    ) -> FieldResult<IngredientNodeConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let args = ConnectionArgs::new(after, before, first, last).with_offset(offset);
        let filter = IngredientFilterArgs {
            name,
            name_icontains,
            name_istartswith,
            notes,
            notes_icontains,
            ..Default::default()
        }
        .into_filter()?
        .for_category(self.inner.id);

        ingredient_connection(context, ctx.field().name(), &args, &filter).await
    }
}

#[derive(Clone)]
pub struct IngredientNode {
    pub inner: Ingredient,
}

impl From<Ingredient> for IngredientNode {
    fn from(ingredient: Ingredient) -> Self {
        Self { inner: ingredient }
    }
}

#[Object]
impl IngredientNode {
    /// The ID of the object
    async fn id(&self) -> ID {
        to_global_id(INGREDIENT_NODE, self.inner.id)
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn notes(&self) -> &str {
        &self.inner.notes
    }

    async fn category(&self, ctx: &Context<'_>) -> FieldResult<CategoryNode> {
        let context = ctx.data::<GraphQLContext>()?;
        let category_id = self.inner.category_id;

        context
            .category_loader
            .load_one(category_id)
            .await?
            .map(|c| c.into())
            .ok_or_else(|| format!("Category {category_id} not found").into())
    }
}
