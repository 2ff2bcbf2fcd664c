use crate::error::{CookbookError, Result};
use crate::graphql::relay::{
    decode_pk, from_global_id, resolve_pk, slice_window, window_edges, ConnectionArgs, OutOfRange,
    SliceLimits,
};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::node::{CATEGORY_NODE, INGREDIENT_NODE};
use crate::graphql::types::{
    CategoryNode, CategoryNodeConnection, IngredientNode, IngredientNodeConnection, Node,
};
use crate::storage::{CategoryFilter, IngredientFilter};
use async_graphql::{Context, FieldResult, Object, ID};

/// Filter arguments accepted by ingredient connections.
#[derive(Debug, Default)]
pub struct IngredientFilterArgs {
    pub name: Option<String>,
    pub name_icontains: Option<String>,
    pub name_istartswith: Option<String>,
    pub notes: Option<String>,
    pub notes_icontains: Option<String>,
    pub category: Option<ID>,
    pub category_name: Option<String>,
}

impl IngredientFilterArgs {
    pub fn into_filter(self) -> Result<IngredientFilter> {
        let category_id = self
            .category
            .map(|id| resolve_pk(CATEGORY_NODE, &id))
            .transpose()?;

        Ok(IngredientFilter {
            name: self.name,
            name_icontains: self.name_icontains,
            name_istartswith: self.name_istartswith,
            notes: self.notes,
            notes_icontains: self.notes_icontains,
            category_id,
            category_name: self.category_name,
        })
    }
}

fn filter_limits<'a>(context: &GraphQLContext, field_name: &'a str) -> SliceLimits<'a> {
    SliceLimits {
        field_name,
        max_limit: context.max_limit,
        out_of_range: OutOfRange::Clamp,
    }
}

/// `field_name` is the GraphQL field being resolved; it appears in argument errors.
pub(crate) async fn ingredient_connection(
    context: &GraphQLContext,
    field_name: &str,
    args: &ConnectionArgs,
    filter: &IngredientFilter,
) -> FieldResult<IngredientNodeConnection> {
    let limits = filter_limits(context, field_name);
    let listing = context
        .storage
        .list_ingredients_page(filter, &|total| Ok(slice_window(args, total, limits)?.page()))
        .await?;
    let window = slice_window(args, listing.total, limits)?;

    let mut connection = IngredientNodeConnection::new(window.has_previous_page, window.has_next_page);
    connection.edges = window_edges(&window, listing.items);
    Ok(connection)
}

pub(crate) async fn category_connection(
    context: &GraphQLContext,
    field_name: &str,
    args: &ConnectionArgs,
    filter: &CategoryFilter,
) -> FieldResult<CategoryNodeConnection> {
    let limits = filter_limits(context, field_name);
    let listing = context
        .storage
        .list_categories_page(filter, &|total| Ok(slice_window(args, total, limits)?.page()))
        .await?;
    let window = slice_window(args, listing.total, limits)?;

    let mut connection = CategoryNodeConnection::new(window.has_previous_page, window.has_next_page);
    connection.edges = window_edges(&window, listing.items);
    Ok(connection)
}

/// Root query object for the ingredients (Relay) schema
pub struct RelayQuery;

#[Object(name = "Query")]
impl RelayQuery {
    /// Fetch any object by its global ID
    async fn node(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<Node>> {
        let context = ctx.data::<GraphQLContext>()?;
        let (type_name, _) = from_global_id(&id)?;

        match type_name.as_str() {
            CATEGORY_NODE => {
                let pk = decode_pk(CATEGORY_NODE, &id)?;
                let category = context.storage.get_category(pk).await?;
                Ok(category.map(|c| Node::CategoryNode(c.into())))
            }
            INGREDIENT_NODE => {
                let pk = decode_pk(INGREDIENT_NODE, &id)?;
                let ingredient = context.storage.get_ingredient(pk).await?;
                Ok(ingredient.map(|i| Node::IngredientNode(i.into())))
            }
            other => Err(CookbookError::InvalidId(format!(
                "Relay Node \"{other}\" not found in schema"
            ))
            .into()),
        }
    }

    /// Fetch a category by its global ID
    async fn category(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<CategoryNode>> {
        let context = ctx.data::<GraphQLContext>()?;
        let pk = decode_pk(CATEGORY_NODE, &id)?;

        let category = context.storage.get_category(pk).await?;
        Ok(category.map(|c| c.into()))
    }

    /// Categories, optionally filtered by name or by the ingredients they hold
    #[allow(clippy::too_many_arguments)]
    async fn all_categories(
        &self,
        ctx: &Context<'_>,
        offset: Option<i32>,
        before: Option<String>,
        after: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        name: Option<String>,
        ingredients: Option<Vec<Option<ID>>>,
    ) -> FieldResult<CategoryNodeConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let args = ConnectionArgs::new(after, before, first, last).with_offset(offset);
        let ingredient_ids = ingredients
            .unwrap_or_default()
            .iter()
            .flatten()
            .map(|id| resolve_pk(INGREDIENT_NODE, id))
            .collect::<Result<Vec<_>>>()?;
        let filter = CategoryFilter {
            name,
            ingredient_ids,
        };

        category_connection(context, ctx.field().name(), &args, &filter).await
    }

    /// Fetch an ingredient by its global ID
    async fn ingredient(&self, ctx: &Context<'_>, id: ID) -> FieldResult<Option<IngredientNode>> {
        let context = ctx.data::<GraphQLContext>()?;
        let pk = decode_pk(INGREDIENT_NODE, &id)?;

        let ingredient = context.storage.get_ingredient(pk).await?;
        Ok(ingredient.map(|i| i.into()))
    }

    /// Ingredients, filtered by name, notes or category
    #[allow(clippy::too_many_arguments)]
    async fn all_ingredients(
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
        category: Option<ID>,
        #[graphql(name = "category_Name")] category_name: Option<String>,
    ) -> FieldResult<IngredientNodeConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let args = ConnectionArgs::new(after, before, first, last).with_offset(offset);
        let filter = IngredientFilterArgs {
            name,
            name_icontains,
            name_istartswith,
            notes,
            notes_icontains,
            category,
            category_name,
        }
        .into_filter()?;

        ingredient_connection(context, ctx.field().name(), &args, &filter).await
    }
}
