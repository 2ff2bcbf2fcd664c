use crate::domain::Ingredient;
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::CategoryType;
use async_graphql::{Context, FieldResult, Object, ID};

/// GraphQL representation of an Ingredient
#[derive(Clone)]
pub struct IngredientType {
    pub inner: Ingredient,
}

impl From<Ingredient> for IngredientType {
    fn from(ingredient: Ingredient) -> Self {
        Self { inner: ingredient }
    }
}

#[Object]
impl IngredientType {
    /// The primary key of the ingredient
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn notes(&self) -> &str {
        &self.inner.notes
    }

    /// The category this ingredient belongs to
    async fn category(&self, ctx: &Context<'_>) -> FieldResult<CategoryType> {
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
