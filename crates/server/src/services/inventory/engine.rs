//! The inventory engine.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use batchwise_core::{AdjustmentCategory, BatchId, ExpiryBand, ProductId, generate_batch_code};

use super::error::EngineError;
use super::fifo::{describe_draws, plan_consumption};
use super::ledger::{RECONCILE_NOTE, SYSTEM_ACTOR, StockChange, compose_note};
use crate::db::{InventoryStore, RepositoryError};
use crate::models::{
    Adjustment, Batch, BatchConsumption, ConsumptionReceipt, CreateProductInput, ExpiringBatch,
    NewBatch, NewProduct, Product, ProductCreated, Reconciliation, RestockInput,
};
use crate::services::clock::Clock;

/// Tunables for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Shelf life given to starting stock when no expiry is supplied.
    pub default_shelf_life_days: i64,
    /// Ledger entries older than this are purged by default.
    pub adjustment_retention_days: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_shelf_life_days: 365,
            adjustment_retention_days: 365,
        }
    }
}

/// What reconciliation does with stock on a product that has no batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Untracked {
    /// Reset it to the (empty) batch total.
    Overwrite,
    /// Leave it as recorded.
    Keep,
}

/// Batch-level inventory with expiry-ordered consumption.
///
/// Every mutation runs in one unit of work: the product row is locked first,
/// batches are read and written under that lock, the aggregate is updated and
/// exactly one ledger entry is appended before the unit commits.
#[derive(Clone)]
pub struct InventoryEngine {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl fmt::Debug for InventoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl InventoryEngine {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    /// Today's date according to the engine's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Repository` if the store can't be reached.
    pub async fn ping(&self) -> Result<(), EngineError> {
        Ok(self.store.ping().await?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product, receiving any starting stock as its first batch.
    ///
    /// The starting batch expires on `starting_expiry`, or after the default
    /// shelf life. A failure to receive it is logged and leaves the product in
    /// place with zero stock.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for an empty title, a negative price
    /// or negative starting stock.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
        actor: &str,
    ) -> Result<ProductCreated, EngineError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("product title must not be empty"));
        }
        if input.unit_price < Decimal::ZERO {
            return Err(EngineError::validation("unit price must not be negative"));
        }
        if input.starting_stock < 0 {
            return Err(EngineError::validation(
                "starting stock must not be negative",
            ));
        }
        let unit_name = match input.unit.trim() {
            "" => "unit",
            unit => unit,
        };

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;
        let product = unit
            .insert_product(&NewProduct {
                title: title.to_owned(),
                unit_price: input.unit_price,
                unit: unit_name.to_owned(),
                category: input
                    .category
                    .map(|c| c.trim().to_owned())
                    .filter(|c| !c.is_empty()),
                initial_stock: input.starting_stock,
                created_at: now,
            })
            .await?;
        unit.commit().await?;

        info!(product_id = %product.id, title = %product.title, "Product created");

        let mut starting_batch = None;
        if input.starting_stock > 0 {
            let expiry_date = input
                .starting_expiry
                .unwrap_or_else(|| add_days(now.date_naive(), self.settings.default_shelf_life_days));
            let restock = RestockInput {
                quantity: input.starting_stock,
                expiry_date,
                note: Some("starting stock".to_owned()),
            };
            match self.restock(product.id, restock, actor).await {
                Ok(batch) => starting_batch = Some(batch),
                Err(e) => warn!(
                    product_id = %product.id,
                    starting_stock = input.starting_stock,
                    error = %e,
                    "Failed to receive starting stock; product created without it"
                ),
            }
        }

        let product = self.get_product(product.id).await?;
        Ok(ProductCreated {
            product,
            starting_batch,
        })
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ProductNotFound` if the product doesn't exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, EngineError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(EngineError::ProductNotFound(id))
    }

    /// List all products by title.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Repository` if the store fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, EngineError> {
        Ok(self.store.list_products().await?)
    }

    /// List a product's live batches in consumption order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ProductNotFound` if the product doesn't exist.
    pub async fn list_batches(&self, product_id: ProductId) -> Result<Vec<Batch>, EngineError> {
        self.get_product(product_id).await?;
        Ok(self.store.list_live_batches(product_id).await?)
    }

    // =========================================================================
    // Stock movements
    // =========================================================================

    /// Receive a new batch of a product.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for a non-positive quantity or an
    /// expiry date that isn't after today, and `EngineError::ProductNotFound`
    /// for an unknown product.
    #[instrument(skip(self, input), fields(product_id = %product_id, quantity = input.quantity, expiry = %input.expiry_date))]
    pub async fn restock(
        &self,
        product_id: ProductId,
        input: RestockInput,
        actor: &str,
    ) -> Result<Batch, EngineError> {
        if input.quantity <= 0 {
            return Err(EngineError::validation("restock quantity must be positive"));
        }
        let now = self.clock.now();
        let today = now.date_naive();
        if input.expiry_date <= today {
            return Err(EngineError::validation(format!(
                "expiry date {} must be after today ({today})",
                input.expiry_date
            )));
        }

        let mut unit = self.store.begin().await?;
        let product = unit
            .lock_product(product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))?;
        let quantity_after = product
            .stock
            .checked_add(input.quantity)
            .ok_or_else(|| EngineError::validation("restock would overflow product stock"))?;

        let existing = unit.next_batch_sequence(product_id).await?;
        let batch = unit
            .insert_batch(&NewBatch {
                product_id,
                batch_code: generate_batch_code(&product.title, existing, today),
                quantity: input.quantity,
                expiry_date: input.expiry_date,
                created_at: now,
            })
            .await?;

        StockChange {
            product: &product,
            category: AdjustmentCategory::Restock,
            quantity_after,
            note: compose_note(
                format!("received batch {}", batch.batch_code),
                input.note.as_deref(),
            ),
            actor,
            at: now,
        }
        .apply(unit.as_mut())
        .await?;
        unit.commit().await?;

        info!(
            batch_id = %batch.id,
            batch_code = %batch.batch_code,
            stock = quantity_after,
            "Batch received"
        );
        Ok(batch)
    }

    /// Draw `quantity` units from a product's batches, soonest expiry first.
    ///
    /// Either the whole quantity is drawn or nothing changes.
    ///
    /// # Errors
    ///
    /// - `EngineError::Validation` if `quantity` isn't positive
    /// - `EngineError::ProductNotFound` for an unknown product
    /// - `EngineError::Unavailable` if the product has no live batches
    /// - `EngineError::InsufficientStock` if the batches can't cover it
    /// - `EngineError::Consistency` if the stored aggregate is below the
    ///   quantity the batches would release
    #[instrument(skip(self, note), fields(product_id = %product_id))]
    pub async fn consume(
        &self,
        product_id: ProductId,
        quantity: i32,
        note: Option<&str>,
        actor: &str,
    ) -> Result<ConsumptionReceipt, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::validation("consumption quantity must be positive"));
        }

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;
        let product = unit
            .lock_product(product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))?;
        let batches = unit.lock_live_batches(product_id).await?;
        if batches.is_empty() {
            return Err(EngineError::Unavailable(product_id));
        }

        let draws = plan_consumption(&batches, quantity).map_err(|shortfall| {
            EngineError::InsufficientStock {
                product_id,
                requested: shortfall.requested,
                available: shortfall.available,
            }
        })?;

        if product.stock < quantity {
            drop(unit);
            return Err(self.repair_inconsistency(&product).await);
        }

        for draw in &draws {
            if draw.exhausts_batch() {
                unit.delete_batch(draw.batch_id).await?;
            } else {
                unit.update_batch_quantity(draw.batch_id, draw.remaining)
                    .await?;
            }
        }

        let adjustment = StockChange {
            product: &product,
            category: AdjustmentCategory::Consumption,
            quantity_after: product.stock - quantity,
            note: compose_note(format!("consumed {}", describe_draws(&draws)), note),
            actor,
            at: now,
        }
        .apply(unit.as_mut())
        .await?;
        unit.commit().await?;

        info!(
            batches = draws.len(),
            stock = adjustment.quantity_after,
            "Stock consumed"
        );
        Ok(ConsumptionReceipt {
            allocations: draws.iter().map(BatchConsumption::from).collect(),
            adjustment,
        })
    }

    /// Set a product's aggregate stock directly, bypassing batches.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for a negative quantity and
    /// `EngineError::ProductNotFound` for an unknown product.
    #[instrument(skip(self, note), fields(product_id = %product_id))]
    pub async fn correct(
        &self,
        product_id: ProductId,
        new_quantity: i32,
        note: Option<&str>,
        actor: &str,
    ) -> Result<Adjustment, EngineError> {
        if new_quantity < 0 {
            return Err(EngineError::validation("corrected stock must not be negative"));
        }

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;
        let product = unit
            .lock_product(product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))?;

        let adjustment = StockChange {
            product: &product,
            category: AdjustmentCategory::Correction,
            quantity_after: new_quantity,
            note: compose_note("manual correction".to_owned(), note),
            actor,
            at: now,
        }
        .apply(unit.as_mut())
        .await?;
        unit.commit().await?;

        info!(
            before = adjustment.quantity_before,
            after = adjustment.quantity_after,
            "Stock corrected"
        );
        Ok(adjustment)
    }

    /// Remove a live batch, e.g. spoiled goods.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::BatchNotFound` for an unknown or exhausted batch
    /// and `EngineError::Consistency` if the aggregate is below the batch's
    /// remaining quantity.
    #[instrument(skip(self, note), fields(batch_id = %batch_id))]
    pub async fn delete_batch(
        &self,
        batch_id: BatchId,
        note: Option<&str>,
        actor: &str,
    ) -> Result<Adjustment, EngineError> {
        let found = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or(EngineError::BatchNotFound(batch_id))?;

        let now = self.clock.now();
        let mut unit = self.store.begin().await?;
        let product = unit
            .lock_product(found.product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(found.product_id))?;
        // Re-read under the product lock; a consumer may have emptied it.
        let batch = unit
            .lock_batch(batch_id)
            .await?
            .ok_or(EngineError::BatchNotFound(batch_id))?;

        if product.stock < batch.quantity {
            drop(unit);
            return Err(self.repair_inconsistency(&product).await);
        }

        unit.delete_batch(batch_id).await?;
        let adjustment = StockChange {
            product: &product,
            category: AdjustmentCategory::Deletion,
            quantity_after: product.stock - batch.quantity,
            note: compose_note(
                format!("removed batch {} ({} left)", batch.batch_code, batch.quantity),
                note,
            ),
            actor,
            at: now,
        }
        .apply(unit.as_mut())
        .await?;
        unit.commit().await?;

        info!(
            product_id = %product.id,
            batch_code = %batch.batch_code,
            units = batch.quantity,
            "Batch removed"
        );
        Ok(adjustment)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Recompute a product's aggregate from its live batches.
    ///
    /// A correction entry is recorded only when the value changes, so calling
    /// this repeatedly is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ProductNotFound` for an unknown product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn reconcile(&self, product_id: ProductId) -> Result<Reconciliation, EngineError> {
        self.reconcile_with(product_id, Untracked::Overwrite)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))
    }

    /// Reconcile one product; `None` when untracked stock was left alone.
    async fn reconcile_with(
        &self,
        product_id: ProductId,
        untracked: Untracked,
    ) -> Result<Option<Reconciliation>, EngineError> {
        let now = self.clock.now();
        let mut unit = self.store.begin().await?;
        let product = unit
            .lock_product(product_id)
            .await?
            .ok_or(EngineError::ProductNotFound(product_id))?;

        let total = unit.live_batch_total(product_id).await?;
        let batch_total = i32::try_from(total).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "batch total {total} for product {product_id} exceeds the stock range"
            ))
        })?;

        // Live batches always hold stock, so a zero total means none exist.
        if batch_total == 0 && untracked == Untracked::Keep {
            return Ok(None);
        }

        let adjustment = if product.stock == batch_total {
            None
        } else {
            let adjustment = StockChange {
                product: &product,
                category: AdjustmentCategory::Correction,
                quantity_after: batch_total,
                note: RECONCILE_NOTE.to_owned(),
                actor: SYSTEM_ACTOR,
                at: now,
            }
            .apply(unit.as_mut())
            .await?;
            Some(adjustment)
        };
        unit.commit().await?;

        if adjustment.is_some() {
            warn!(
                previous = product.stock,
                batch_total, "Stock aggregate drifted from batches; reconciled"
            );
        }

        Ok(Some(Reconciliation {
            product_id,
            previous_stock: product.stock,
            batch_total,
            adjustment,
        }))
    }

    /// Reconcile every product that has live batches, returning only the ones
    /// that had drifted.
    ///
    /// Products without batches keep their untracked stock.
    ///
    /// # Errors
    ///
    /// Stops at the first product that fails to reconcile.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self) -> Result<Vec<Reconciliation>, EngineError> {
        let products = self.store.list_products().await?;
        let checked = products.len();

        let mut repaired = Vec::new();
        let mut untracked = 0_usize;
        for product in products {
            match self.reconcile_with(product.id, Untracked::Keep).await? {
                Some(reconciliation) if reconciliation.changed() => repaired.push(reconciliation),
                Some(_) => {}
                None => untracked += 1,
            }
        }

        info!(
            checked,
            untracked,
            repaired = repaired.len(),
            "Reconciliation complete"
        );
        Ok(repaired)
    }

    /// Reconcile after a blocked mutation and build the error to surface.
    async fn repair_inconsistency(&self, product: &Product) -> EngineError {
        match self.reconcile(product.id).await {
            Ok(reconciliation) => {
                error!(
                    product_id = %product.id,
                    stock = product.stock,
                    batch_total = reconciliation.batch_total,
                    "Stock aggregate below batch ledger; operation aborted and aggregate reconciled"
                );
                EngineError::Consistency {
                    product_id: product.id,
                    stock: product.stock,
                    batch_total: i64::from(reconciliation.batch_total),
                }
            }
            Err(e) => {
                error!(
                    product_id = %product.id,
                    error = %e,
                    "Stock aggregate below batch ledger and reconciliation failed"
                );
                e
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Live batches expiring between today and `days` from now, inclusive,
    /// soonest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for a negative `days`.
    pub async fn expiring(&self, days: i64) -> Result<Vec<ExpiringBatch>, EngineError> {
        if days < 0 {
            return Err(EngineError::validation("expiry threshold must not be negative"));
        }

        let today = self.clock.today();
        let until = add_days(today, days);
        let rows = self.store.list_expiring_batches(today, until).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let days_until_expiry = (row.batch.expiry_date - today).num_days();
                ExpiringBatch {
                    band: ExpiryBand::classify(days_until_expiry),
                    days_until_expiry,
                    batch: row.batch,
                    product: row.product,
                }
            })
            .collect())
    }

    /// A product's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ProductNotFound` for an unknown product.
    pub async fn history(&self, product_id: ProductId) -> Result<Vec<Adjustment>, EngineError> {
        self.get_product(product_id).await?;
        Ok(self.store.list_adjustments_for_product(product_id).await?)
    }

    /// Ledger entries from the last `since_days` days, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for a negative `since_days`.
    pub async fn recent(&self, since_days: i64) -> Result<Vec<Adjustment>, EngineError> {
        if since_days < 0 {
            return Err(EngineError::validation("day count must not be negative"));
        }
        let since = sub_days(self.clock.now(), since_days);
        Ok(self.store.list_adjustments_since(since).await?)
    }

    /// Delete ledger entries older than `older_than_days`, or the configured
    /// retention when `None`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for a negative day count.
    #[instrument(skip(self))]
    pub async fn purge_adjustments(&self, older_than_days: Option<i64>) -> Result<u64, EngineError> {
        let days = older_than_days.unwrap_or(self.settings.adjustment_retention_days);
        if days < 0 {
            return Err(EngineError::validation("retention must not be negative"));
        }

        let cutoff = sub_days(self.clock.now(), days);
        let mut unit = self.store.begin().await?;
        let purged = unit.purge_adjustments_before(cutoff).await?;
        unit.commit().await?;

        info!(purged, %cutoff, "Purged old adjustments");
        Ok(purged)
    }
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(NaiveDate::MAX)
}

fn sub_days(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| at.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
