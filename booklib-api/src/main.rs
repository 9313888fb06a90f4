//! booklib-api - Book Catalog Service
//!
//! REST API for cataloguing books, authors, tags, users, comments and
//! ratings, with optional enrichment from third-party metadata services
//! (Open Library, Google Books).

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use booklib_api::providers::ProviderRegistry;
use booklib_api::AppState;
use booklib_common::config::{resolve_root_folder, RootFolder, TomlConfig};

/// Default HTTP listen port
const DEFAULT_PORT: u16 = 5740;

#[derive(Debug, Parser)]
#[command(name = "booklib-api", version, about = "Book catalog service")]
struct Args {
    /// Root folder holding the database (overrides env and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port (overrides config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting booklib-api (Book Catalog) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Configuration: CLI > environment > TOML > defaults
    let toml_config = TomlConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);

    let root = RootFolder::new(resolve_root_folder(
        args.root_folder.as_deref(),
        &toml_config,
    ));
    root.ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = root.database_path();
    info!("Database: {}", db_path.display());

    // Initialize database connection pool
    let db_pool = booklib_api::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Provider registry is built once at startup and held immutably
    let registry = Arc::new(ProviderRegistry::builtin(
        toml_config.default_provider.as_deref(),
    ));
    info!(
        providers = ?registry.names(),
        default = registry.default_name(),
        "Metadata providers registered"
    );

    // Create application state
    let state = AppState::new(db_pool, registry);

    // Build router
    let app = booklib_api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
