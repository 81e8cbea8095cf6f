//! `PostgreSQL` implementation of the inventory store.
//!
//! Queries are checked at runtime (`query_as::<_, Row>`) so the crate builds
//! without a live database or an offline query cache.
//!
//! Locking: a unit locks the product row first (`FOR UPDATE`) and only then
//! its batch rows, so concurrent units on one product queue behind each other
//! and never deadlock on lock order.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use batchwise_core::{AdjustmentCategory, AdjustmentId, BatchId, ProductId};

use super::{InventoryStore, InventoryUnit, RepositoryError};
use crate::models::{
    Adjustment, Batch, BatchWithProduct, NewAdjustment, NewBatch, NewProduct, Product,
    ProductSummary,
};

const PRODUCT_COLUMNS: &str = "id, title, unit_price, unit, category, stock, initial_stock, \
     batch_sequence, created_at, updated_at";

const BATCH_COLUMNS: &str = "id, product_id, batch_code, quantity, expiry_date, created_at";

const ADJUSTMENT_COLUMNS: &str = "id, product_id, category, quantity_before, quantity_after, \
     difference, note, actor, created_at";

const BATCH_CODE_CONSTRAINT: &str = "batch_product_code_key";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    unit_price: Decimal,
    unit: String,
    category: Option<String>,
    stock: i32,
    initial_stock: i32,
    batch_sequence: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            unit_price: row.unit_price,
            unit: row.unit,
            category: row.category,
            stock: row.stock,
            initial_stock: row.initial_stock,
            batch_sequence: row.batch_sequence,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: i32,
    product_id: i32,
    batch_code: String,
    quantity: i32,
    expiry_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: BatchId::new(row.id),
            product_id: ProductId::new(row.product_id),
            batch_code: row.batch_code,
            quantity: row.quantity,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
        }
    }
}

/// Batch joined with its product's summary columns.
#[derive(Debug, sqlx::FromRow)]
struct BatchWithProductRow {
    id: i32,
    product_id: i32,
    batch_code: String,
    quantity: i32,
    expiry_date: NaiveDate,
    created_at: DateTime<Utc>,
    title: String,
    category: Option<String>,
    unit: String,
}

impl From<BatchWithProductRow> for BatchWithProduct {
    fn from(row: BatchWithProductRow) -> Self {
        Self {
            batch: Batch {
                id: BatchId::new(row.id),
                product_id: ProductId::new(row.product_id),
                batch_code: row.batch_code,
                quantity: row.quantity,
                expiry_date: row.expiry_date,
                created_at: row.created_at,
            },
            product: ProductSummary {
                id: ProductId::new(row.product_id),
                title: row.title,
                category: row.category,
                unit: row.unit,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdjustmentRow {
    id: i32,
    product_id: i32,
    category: AdjustmentCategory,
    quantity_before: i32,
    quantity_after: i32,
    difference: i32,
    note: String,
    actor: String,
    created_at: DateTime<Utc>,
}

impl From<AdjustmentRow> for Adjustment {
    fn from(row: AdjustmentRow) -> Self {
        Self {
            id: AdjustmentId::new(row.id),
            product_id: ProductId::new(row.product_id),
            category: row.category,
            quantity_before: row.quantity_before,
            quantity_after: row.quantity_after,
            difference: row.difference,
            note: row.note,
            actor: row.actor,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Inventory store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn begin(&self) -> Result<Box<dyn InventoryUnit>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgInventoryUnit { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM inventory.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM inventory.product ORDER BY title ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM inventory.batch WHERE id = $1 AND quantity > 0"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_live_batches(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Batch>, RepositoryError> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r"
            SELECT {BATCH_COLUMNS}
            FROM inventory.batch
            WHERE product_id = $1 AND quantity > 0
            ORDER BY expiry_date ASC, created_at ASC, id ASC
            "
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_expiring_batches(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BatchWithProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, BatchWithProductRow>(
            r"
            SELECT
                b.id, b.product_id, b.batch_code, b.quantity, b.expiry_date, b.created_at,
                p.title, p.category, p.unit
            FROM inventory.batch b
            INNER JOIN inventory.product p ON p.id = b.product_id
            WHERE b.quantity > 0
                AND b.expiry_date >= $1
                AND b.expiry_date <= $2
            ORDER BY b.expiry_date ASC, b.created_at ASC, b.id ASC
            ",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_adjustments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Adjustment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM inventory.adjustment
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_adjustments_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Adjustment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM inventory.adjustment
            WHERE created_at >= $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// A unit of work backed by a database transaction.
///
/// Dropping it without committing rolls the transaction back.
struct PgInventoryUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryUnit for PgInventoryUnit {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO inventory.product (
                title, unit_price, unit, category, stock, initial_stock,
                batch_sequence, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, $5, 0, $6, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.title)
        .bind(product.unit_price)
        .bind(&product.unit)
        .bind(&product.category)
        .bind(product.initial_stock)
        .bind(product.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM inventory.product WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn lock_live_batches(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<Batch>, RepositoryError> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r"
            SELECT {BATCH_COLUMNS}
            FROM inventory.batch
            WHERE product_id = $1 AND quantity > 0
            ORDER BY expiry_date ASC, created_at ASC, id ASC
            FOR UPDATE
            "
        ))
        .bind(product_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lock_batch(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM inventory.batch WHERE id = $1 AND quantity > 0 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn next_batch_sequence(&mut self, product_id: ProductId) -> Result<i32, RepositoryError> {
        sqlx::query_scalar::<_, i32>(
            r"
            UPDATE inventory.product
            SET batch_sequence = batch_sequence + 1
            WHERE id = $1
            RETURNING batch_sequence - 1
            ",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r"
            INSERT INTO inventory.batch (product_id, batch_code, quantity, expiry_date, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BATCH_COLUMNS}
            "
        ))
        .bind(batch.product_id)
        .bind(&batch.batch_code)
        .bind(batch.quantity)
        .bind(batch.expiry_date)
        .bind(batch.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(BATCH_CODE_CONSTRAINT)
            {
                return RepositoryError::Conflict(format!(
                    "batch code {} already exists for product {}",
                    batch.batch_code, batch.product_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn update_batch_quantity(
        &mut self,
        id: BatchId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE inventory.batch SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_batch(&mut self, id: BatchId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory.batch WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn live_batch_total(&mut self, product_id: ProductId) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(quantity), 0)::bigint
            FROM inventory.batch
            WHERE product_id = $1 AND quantity > 0
            ",
        )
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(total)
    }

    async fn set_product_stock(
        &mut self,
        id: ProductId,
        stock: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE inventory.product SET stock = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(stock)
                .bind(updated_at)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn insert_adjustment(
        &mut self,
        adjustment: &NewAdjustment,
    ) -> Result<Adjustment, RepositoryError> {
        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r"
            INSERT INTO inventory.adjustment (
                product_id, category, quantity_before, quantity_after,
                note, actor, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ADJUSTMENT_COLUMNS}
            "
        ))
        .bind(adjustment.product_id)
        .bind(adjustment.category)
        .bind(adjustment.quantity_before)
        .bind(adjustment.quantity_after)
        .bind(&adjustment.note)
        .bind(&adjustment.actor)
        .bind(adjustment.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn purge_adjustments_before(
        &mut self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory.adjustment WHERE created_at < $1")
            .bind(cutoff)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
