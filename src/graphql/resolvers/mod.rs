pub mod mutation;
pub mod query;
pub mod relay_query;

pub use mutation::Mutation;
pub use query::Query;
pub use relay_query::RelayQuery;
