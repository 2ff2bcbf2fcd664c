use crate::error::{CookbookError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve the GraphiQL IDE next to each GraphQL endpoint
    pub graphiql: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Largest `first`/`last` a filterable connection accepts. `0` disables the cap.
    pub max_limit: usize,
}

impl RelayConfig {
    pub fn limit(&self) -> Option<usize> {
        (self.max_limit > 0).then_some(self.max_limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log file. `None` logs to the console only.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    /// Used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            graphiql: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("data/cookbook.db"),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_limit: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: Some(PathBuf::from("logs")),
            file_prefix: "cookbook.log".to_string(),
            default_filter: "cookbook=info".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file if it exists, then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CookbookError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `COOKBOOK_PORT`, `COOKBOOK_DATABASE_PATH` and `COOKBOOK_MAX_LIMIT` win over the file.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = var("COOKBOOK_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| CookbookError::Config(format!("Invalid COOKBOOK_PORT '{port}'")))?;
        }
        if let Some(path) = var("COOKBOOK_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(limit) = var("COOKBOOK_MAX_LIMIT") {
            self.relay.max_limit = limit.parse().map_err(|_| {
                CookbookError::Config(format!("Invalid COOKBOOK_MAX_LIMIT '{limit}'"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load("definitely/not/here.toml").unwrap();
        assert_eq!(config.relay.limit(), Some(100));
        assert_eq!(config.database.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [database]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert_eq!(config.logging.file_prefix, "cookbook.log");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COOKBOOK_PORT", "7000"),
            ("COOKBOOK_DATABASE_PATH", "/tmp/other.db"),
            ("COOKBOOK_MAX_LIMIT", "0"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.relay.limit(), None);
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|key| (key == "COOKBOOK_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, CookbookError::Config(_)));
    }
}
