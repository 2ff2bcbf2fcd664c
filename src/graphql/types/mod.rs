pub mod category;
pub mod ingredient;
pub mod node;

pub use category::{CategoryConnection, CategorySummary, CategoryType, CookbookNode};
pub use ingredient::IngredientType;
pub use node::{CategoryNode, CategoryNodeConnection, IngredientNode, IngredientNodeConnection, Node};
