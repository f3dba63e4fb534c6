//! # Trackshift API Main Entry Point
//!
//! This is the main entry point for the trackshift API service.

use migration::{Migrator, MigratorTrait};
use trackshift::{config::ConfigLoader, db, logging, server::run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    logging::init_subscriber(&config);

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "effective configuration");
    }

    let pool = db::init_pool(&config).await?;
    Migrator::up(&pool, None).await?;
    db::health_check(&pool).await?;

    run_server(config, pool).await
}
