use crate::graphql::relay::{slice_window, window_edges, ConnectionArgs, OutOfRange, SliceLimits};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::category::CategoryConnectionFields;
use crate::graphql::types::{CategoryConnection, CategoryType, IngredientType};
use crate::storage::{CategoryFilter, IngredientFilter, Page};
use async_graphql::{Context, FieldResult, Object};

/// Root query object for the cookbook schema
pub struct Query;

#[Object]
impl Query {
    /// Every ingredient, each with its category
    async fn all_ingredients(&self, ctx: &Context<'_>) -> FieldResult<Vec<IngredientType>> {
        let context = ctx.data::<GraphQLContext>()?;

        let ingredients = context
            .storage
            .list_ingredients(&IngredientFilter::default(), Page::all())
            .await?;
        Ok(ingredients.into_iter().map(|i| i.into()).collect())
    }

    /// Look up a category by its exact name; null when there is none
    async fn category_by_name(&self, ctx: &Context<'_>, name: String) -> FieldResult<Option<CategoryType>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.storage.get_category_by_name(&name).await {
            Ok(category) => Ok(category.map(|c| c.into())),
            Err(e) => Err(e.into()),
        }
    }

    /// All categories as a Relay connection
    async fn categories(
        &self,
        ctx: &Context<'_>,
        before: Option<String>,
        after: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> FieldResult<CategoryConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let args = ConnectionArgs::new(after, before, first, last);
        // Plain array connection: no page-size cap, stray cursors are dropped
        let limits = SliceLimits {
            field_name: ctx.field().name(),
            max_limit: None,
            out_of_range: OutOfRange::Ignore,
        };

        let listing = context
            .storage
            .list_categories_page(&CategoryFilter::default(), &|total| {
                Ok(slice_window(&args, total, limits)?.page())
            })
            .await?;
        let total_count = listing.total;
        let window = slice_window(&args, total_count, limits)?;

        let mut connection = CategoryConnection::with_additional_fields(
            window.has_previous_page,
            window.has_next_page,
            CategoryConnectionFields { total_count },
        );
        connection.edges = window_edges(&window, listing.items);
        Ok(connection)
    }
}
