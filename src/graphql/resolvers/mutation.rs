use crate::domain::{NewCategory, NewIngredient};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{CategoryType, IngredientType};
use crate::observability::metrics;
use async_graphql::{Context, FieldResult, Object, SimpleObject};

/// Payload of `createCategory`
#[derive(SimpleObject)]
pub struct CategoryMutation {
    pub category: Option<CategoryType>,
}

/// Payload of `createIngredient`
#[derive(SimpleObject)]
pub struct IngredientMutation {
    pub ingredient: Option<IngredientType>,
}

/// Root mutation object for the cookbook schema
pub struct Mutation;

#[Object(name = "MyMutation")]
impl Mutation {
    /// Create a category with the given name
    async fn create_category(&self, ctx: &Context<'_>, name: String) -> FieldResult<CategoryMutation> {
        let context = ctx.data::<GraphQLContext>()?;

        let category = context.storage.create_category(NewCategory::new(name)).await?;
        metrics::catalog::record_category_created();
        tracing::info!("Created category: {} (ID: {})", category.name, category.id);

        Ok(CategoryMutation {
            category: Some(category.into()),
        })
    }

    /// Create an ingredient inside an existing category
    async fn create_ingredient(
        &self,
        ctx: &Context<'_>,
        name: String,
        notes: String,
        category: i32,
    ) -> FieldResult<IngredientMutation> {
        let context = ctx.data::<GraphQLContext>()?;

        match context
            .storage
            .create_ingredient(NewIngredient::new(name, notes, i64::from(category)))
            .await
        {
            Ok(ingredient) => {
                metrics::catalog::record_ingredient_created();
                tracing::info!("Created ingredient: {} (ID: {})", ingredient.name, ingredient.id);
                Ok(IngredientMutation {
                    ingredient: Some(ingredient.into()),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to create ingredient in category {}: {}", category, e);
                Err(e.into())
            }
        }
    }
}
