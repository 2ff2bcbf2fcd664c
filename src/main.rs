use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cookbook::config::{Config, StorageBackend, DEFAULT_CONFIG_PATH};
use cookbook::fixtures::Fixture;
use cookbook::graphql::{create_cookbook_schema, create_ingredients_schema};
use cookbook::observability::{init_logging, metrics};
use cookbook::server;
use cookbook::storage::{InMemoryStorage, SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "cookbook")]
#[command(about = "GraphQL API for categories and ingredients")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the GraphQL HTTP server
    Serve {
        /// Port to run the server on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep data in memory instead of the configured database
        #[arg(long)]
        in_memory: bool,
    },
    /// Create or update the database tables
    Migrate,
    /// Load a JSON fixture into the database
    LoadFixture {
        /// Fixture file, e.g. fixtures/ingredients.json
        path: PathBuf,
    },
    /// Print a schema in SDL form
    ExportSchema {
        #[arg(long, value_enum, default_value_t = SchemaKind::Cookbook)]
        schema: SchemaKind,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Cookbook,
    Ingredients,
}

fn open_sqlite(config: &Config) -> Result<SqliteStorage> {
    info!("Initializing database storage at {}", config.database.path.display());
    let storage = SqliteStorage::open(&config.database.path)?;
    storage.run_migrations()?;
    Ok(storage)
}

fn create_storage(config: &Config, in_memory: bool) -> Result<Arc<dyn Storage>> {
    if in_memory || config.database.backend == StorageBackend::Memory {
        info!("Using in-memory storage");
        Ok(Arc::new(InMemoryStorage::new()))
    } else {
        let storage = open_sqlite(config)?;
        info!("Database storage initialized successfully");
        Ok(Arc::new(storage))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let mut config = Config::load(&cli.config)?;
    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port, in_memory } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            metrics::init();
            let storage = create_storage(&config, in_memory)?;

            if in_memory || config.database.backend == StorageBackend::Memory {
                println!("🧠 Using in-memory storage (data will not persist)");
            } else {
                println!("💾 Using database {}", config.database.path.display());
            }

            server::start_server(storage, &config.server, &config.relay).await?;
        }
        Commands::Migrate => {
            open_sqlite(&config)?;
            println!("✅ Migrations applied to {}", config.database.path.display());
        }
        Commands::LoadFixture { path } => {
            let storage = open_sqlite(&config)?;
            let fixture = Fixture::read(&path)?;
            let summary = fixture.load_into(&storage).await?;
            println!(
                "✅ Installed {} object(s) from {}",
                summary.total(),
                path.display()
            );
        }
        Commands::ExportSchema { schema, out } => {
            let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
            let sdl = match schema {
                SchemaKind::Cookbook => create_cookbook_schema(storage, &config.relay).sdl(),
                SchemaKind::Ingredients => create_ingredients_schema(storage, &config.relay).sdl(),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, sdl)?;
                    println!("✅ Schema written to {}", path.display());
                }
                None => println!("{sdl}"),
            }
        }
    }

    Ok(())
}
