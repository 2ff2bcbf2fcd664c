pub mod loaders;
pub mod relay;
pub mod resolvers;
pub mod schema;
pub mod types;

pub use schema::{
    create_cookbook_schema, create_ingredients_schema, CookbookSchema, GraphQLContext,
    IngredientsSchema,
};
