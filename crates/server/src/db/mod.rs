//! Storage for the batch inventory.
//!
//! # Backends
//!
//! - [`PgInventoryStore`] - `PostgreSQL` via `sqlx` (store of record)
//! - [`MemoryInventoryStore`] - embedded single-writer store
//!
//! Both implement [`InventoryStore`]. Every mutation happens inside an
//! [`InventoryUnit`]: a unit of work that either commits all of its writes or,
//! when dropped without [`InventoryUnit::commit`], none of them.
//!
//! # Tables (schema `inventory`)
//!
//! - `product` - products with the aggregate `stock` and `batch_sequence`
//! - `batch` - live receipt batches, `UNIQUE (product_id, batch_code)`
//! - `adjustment` - append-only adjustment ledger
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p batchwise-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use batchwise_core::{BatchId, ProductId};

use crate::models::{
    Adjustment, Batch, BatchWithProduct, NewAdjustment, NewBatch, NewProduct, Product,
};

pub use memory::MemoryInventoryStore;
pub use postgres::PgInventoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate batch code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Committed reads and the entry point for units of work.
///
/// Reads never observe a unit that has not committed.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn InventoryUnit>, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// All products ordered by title.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError>;

    /// Live batches of a product in FIFO order.
    async fn list_live_batches(&self, product_id: ProductId)
    -> Result<Vec<Batch>, RepositoryError>;

    /// Live batches expiring in `[from, until]`, soonest first.
    async fn list_expiring_batches(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BatchWithProduct>, RepositoryError>;

    /// Ledger entries of a product, newest first.
    async fn list_adjustments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Adjustment>, RepositoryError>;

    /// Ledger entries created at or after `since`, newest first.
    async fn list_adjustments_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Adjustment>, RepositoryError>;
}

/// A unit of work against the store.
///
/// `lock_*` reads take write locks that are held until the unit ends, so two
/// units touching the same product are serialized.
#[async_trait]
pub trait InventoryUnit: Send {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Read and lock a product row.
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Read and lock the live batches of a product, in FIFO order.
    async fn lock_live_batches(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<Batch>, RepositoryError>;

    /// Read and lock a single batch.
    async fn lock_batch(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError>;

    /// Advance the product's batch counter, returning the number of batches
    /// created before this call.
    async fn next_batch_sequence(&mut self, product_id: ProductId) -> Result<i32, RepositoryError>;

    /// Insert a batch. Fails with `Conflict` on a duplicate code.
    async fn insert_batch(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError>;

    async fn update_batch_quantity(
        &mut self,
        id: BatchId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    async fn delete_batch(&mut self, id: BatchId) -> Result<(), RepositoryError>;

    /// Sum of live batch quantities for a product.
    async fn live_batch_total(&mut self, product_id: ProductId) -> Result<i64, RepositoryError>;

    /// Overwrite the aggregate stock of a product.
    async fn set_product_stock(
        &mut self,
        id: ProductId,
        stock: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Append a ledger entry.
    async fn insert_adjustment(
        &mut self,
        adjustment: &NewAdjustment,
    ) -> Result<Adjustment, RepositoryError>;

    /// Delete ledger entries created before `cutoff`, returning how many.
    async fn purge_adjustments_before(
        &mut self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Make every write of this unit durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
