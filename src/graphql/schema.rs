use crate::config::RelayConfig;
use crate::graphql::loaders::{CategoryIngredientsLoader, CategoryLoader};
use crate::graphql::resolvers::{Mutation, Query, RelayQuery};
use crate::graphql::types::CookbookNode;
use crate::storage::Storage;
use async_graphql::dataloader::DataLoader;
use async_graphql::{EmptyMutation, EmptySubscription, Schema};
use std::sync::Arc;

/// GraphQL context containing shared application state
pub struct GraphQLContext {
    pub storage: Arc<dyn Storage>,
    pub category_loader: DataLoader<CategoryLoader>,
    pub ingredients_loader: DataLoader<CategoryIngredientsLoader>,
    /// Upper bound for `first`/`last` on filterable connections
    pub max_limit: Option<usize>,
}

impl GraphQLContext {
    pub fn new(storage: Arc<dyn Storage>, relay: &RelayConfig) -> Self {
        Self {
            category_loader: CategoryLoader::new(storage.clone()),
            ingredients_loader: CategoryIngredientsLoader::new(storage.clone()),
            storage,
            max_limit: relay.limit(),
        }
    }
}

/// Schema served at `/graphql`: plain object types, a category connection and mutations
pub type CookbookSchema = Schema<Query, Mutation, EmptySubscription>;

/// Schema served at `/ingredients/graphql`: Relay nodes with filterable connections
pub type IngredientsSchema = Schema<RelayQuery, EmptyMutation, EmptySubscription>;

pub fn create_cookbook_schema(storage: Arc<dyn Storage>, relay: &RelayConfig) -> CookbookSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .register_output_type::<CookbookNode>()
        .data(GraphQLContext::new(storage, relay))
        .finish()
}

pub fn create_ingredients_schema(storage: Arc<dyn Storage>, relay: &RelayConfig) -> IngredientsSchema {
    Schema::build(RelayQuery, EmptyMutation, EmptySubscription)
        .data(GraphQLContext::new(storage, relay))
        .finish()
}
