//! CLI command implementations.

pub mod inventory;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use sqlx::PgPool;

use batchwise_server::config::ServerConfig;
use batchwise_server::db::{self, postgres::PgInventoryStore};
use batchwise_server::services::{InventoryEngine, SystemClock};

/// Connect to the database named by the environment.
pub async fn connect() -> Result<(ServerConfig, PgPool), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}

/// Build an engine over the configured database.
pub async fn engine() -> Result<InventoryEngine, Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    Ok(InventoryEngine::new(
        Arc::new(PgInventoryStore::new(pool)),
        Arc::new(SystemClock),
        config.inventory.engine_settings(),
    ))
}
