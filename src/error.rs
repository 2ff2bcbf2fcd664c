use thiserror::Error;

#[derive(Error, Debug)]
pub enum CookbookError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("get() returned more than one {entity} -- it returned {count}!")]
    MultipleObjectsReturned { entity: &'static str, count: usize },

    #[error("{0}")]
    InvalidId(String),

    #[error("{0}")]
    Pagination(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for CookbookError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CookbookError::LockPoisoned(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CookbookError>;
