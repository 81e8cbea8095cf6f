//! Embedded single-writer inventory store.
//!
//! One writer lock serializes all units. A unit works on a private copy of
//! the committed state and swaps it in on commit, so readers only ever see
//! whole units. Used for tests, demos and single-process deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use batchwise_core::{AdjustmentId, BatchId, ProductId};

use super::{InventoryStore, InventoryUnit, RepositoryError};
use crate::models::{
    Adjustment, Batch, BatchWithProduct, NewAdjustment, NewBatch, NewProduct, Product,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    batches: BTreeMap<BatchId, Batch>,
    adjustments: Vec<Adjustment>,
    last_product_id: i32,
    last_batch_id: i32,
    last_adjustment_id: i32,
}

impl MemoryState {
    fn live_batches(&self, product_id: ProductId) -> Vec<Batch> {
        let mut batches: Vec<Batch> = self
            .batches
            .values()
            .filter(|b| b.product_id == product_id && b.quantity > 0)
            .cloned()
            .collect();
        batches.sort_by(|a, b| fifo_key(a).cmp(&fifo_key(b)));
        batches
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product, RepositoryError> {
        self.products.get_mut(&id).ok_or(RepositoryError::NotFound)
    }
}

fn fifo_key(batch: &Batch) -> (NaiveDate, DateTime<Utc>, BatchId) {
    (batch.expiry_date, batch.created_at, batch.id)
}

fn newest_first(adjustments: &mut [Adjustment]) {
    adjustments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

/// In-process inventory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventoryStore {
    committed: Arc<RwLock<MemoryState>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryInventoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a product's aggregate without touching batches or the ledger.
    ///
    /// Simulates an out-of-band writer so drift handling can be exercised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn overwrite_stock_unrecorded(
        &self,
        id: ProductId,
        stock: i32,
    ) -> Result<(), RepositoryError> {
        let _writer = self.writer.lock().await;
        let mut state = self.committed.write().await;
        state.product_mut(id)?.stock = stock;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn begin(&self) -> Result<Box<dyn InventoryUnit>, RepositoryError> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let working = self.committed.read().await.clone();
        Ok(Box::new(MemoryInventoryUnit {
            _writer: writer,
            committed: Arc::clone(&self.committed),
            working,
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.committed.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self
            .committed
            .read()
            .await
            .products
            .values()
            .cloned()
            .collect();
        products.sort_by(|a, b| (&a.title, a.id).cmp(&(&b.title, b.id)));
        Ok(products)
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        Ok(self
            .committed
            .read()
            .await
            .batches
            .get(&id)
            .filter(|b| b.quantity > 0)
            .cloned())
    }

    async fn list_live_batches(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Batch>, RepositoryError> {
        Ok(self.committed.read().await.live_batches(product_id))
    }

    async fn list_expiring_batches(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<BatchWithProduct>, RepositoryError> {
        let state = self.committed.read().await;
        let mut batches: Vec<&Batch> = state
            .batches
            .values()
            .filter(|b| b.quantity > 0 && b.expiry_date >= from && b.expiry_date <= until)
            .collect();
        batches.sort_by_key(|b| fifo_key(b));

        batches
            .into_iter()
            .map(|batch| {
                let product = state.products.get(&batch.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "batch {} references missing product {}",
                        batch.id, batch.product_id
                    ))
                })?;
                Ok(BatchWithProduct {
                    batch: batch.clone(),
                    product: product.summary(),
                })
            })
            .collect()
    }

    async fn list_adjustments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Adjustment>, RepositoryError> {
        let mut adjustments: Vec<Adjustment> = self
            .committed
            .read()
            .await
            .adjustments
            .iter()
            .filter(|a| a.product_id == product_id)
            .cloned()
            .collect();
        newest_first(&mut adjustments);
        Ok(adjustments)
    }

    async fn list_adjustments_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Adjustment>, RepositoryError> {
        let mut adjustments: Vec<Adjustment> = self
            .committed
            .read()
            .await
            .adjustments
            .iter()
            .filter(|a| a.created_at >= since)
            .cloned()
            .collect();
        newest_first(&mut adjustments);
        Ok(adjustments)
    }
}

/// A unit of work holding the writer lock and a private copy of the state.
struct MemoryInventoryUnit {
    _writer: OwnedMutexGuard<()>,
    committed: Arc<RwLock<MemoryState>>,
    working: MemoryState,
}

#[async_trait]
impl InventoryUnit for MemoryInventoryUnit {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.working.last_product_id += 1;
        let created = Product {
            id: ProductId::new(self.working.last_product_id),
            title: product.title.clone(),
            unit_price: product.unit_price,
            unit: product.unit.clone(),
            category: product.category.clone(),
            stock: 0,
            initial_stock: product.initial_stock,
            batch_sequence: 0,
            created_at: product.created_at,
            updated_at: product.created_at,
        };
        self.working.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn lock_live_batches(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<Batch>, RepositoryError> {
        Ok(self.working.live_batches(product_id))
    }

    async fn lock_batch(&mut self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        Ok(self
            .working
            .batches
            .get(&id)
            .filter(|b| b.quantity > 0)
            .cloned())
    }

    async fn next_batch_sequence(&mut self, product_id: ProductId) -> Result<i32, RepositoryError> {
        let product = self.working.product_mut(product_id)?;
        let previous = product.batch_sequence;
        product.batch_sequence += 1;
        Ok(previous)
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> Result<Batch, RepositoryError> {
        if !self.working.products.contains_key(&batch.product_id) {
            return Err(RepositoryError::NotFound);
        }
        let duplicate = self
            .working
            .batches
            .values()
            .any(|b| b.product_id == batch.product_id && b.batch_code == batch.batch_code);
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "batch code {} already exists for product {}",
                batch.batch_code, batch.product_id
            )));
        }

        self.working.last_batch_id += 1;
        let created = Batch {
            id: BatchId::new(self.working.last_batch_id),
            product_id: batch.product_id,
            batch_code: batch.batch_code.clone(),
            quantity: batch.quantity,
            expiry_date: batch.expiry_date,
            created_at: batch.created_at,
        };
        self.working.batches.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_batch_quantity(
        &mut self,
        id: BatchId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let batch = self
            .working
            .batches
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        batch.quantity = quantity;
        Ok(())
    }

    async fn delete_batch(&mut self, id: BatchId) -> Result<(), RepositoryError> {
        self.working
            .batches
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn live_batch_total(&mut self, product_id: ProductId) -> Result<i64, RepositoryError> {
        Ok(self
            .working
            .batches
            .values()
            .filter(|b| b.product_id == product_id && b.quantity > 0)
            .map(|b| i64::from(b.quantity))
            .sum())
    }

    async fn set_product_stock(
        &mut self,
        id: ProductId,
        stock: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let product = self.working.product_mut(id)?;
        product.stock = stock;
        product.updated_at = updated_at;
        Ok(())
    }

    async fn insert_adjustment(
        &mut self,
        adjustment: &NewAdjustment,
    ) -> Result<Adjustment, RepositoryError> {
        if !self.working.products.contains_key(&adjustment.product_id) {
            return Err(RepositoryError::NotFound);
        }
        self.working.last_adjustment_id += 1;
        let created = Adjustment {
            id: AdjustmentId::new(self.working.last_adjustment_id),
            product_id: adjustment.product_id,
            category: adjustment.category,
            quantity_before: adjustment.quantity_before,
            quantity_after: adjustment.quantity_after,
            difference: adjustment.difference(),
            note: adjustment.note.clone(),
            actor: adjustment.actor.clone(),
            created_at: adjustment.created_at,
        };
        self.working.adjustments.push(created.clone());
        Ok(created)
    }

    async fn purge_adjustments_before(
        &mut self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let before = self.working.adjustments.len();
        self.working.adjustments.retain(|a| a.created_at >= cutoff);
        let purged = before - self.working.adjustments.len();
        Ok(u64::try_from(purged).unwrap_or(u64::MAX))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        // The writer lock is released when `unit` drops, after the swap.
        let unit = *self;
        *unit.committed.write().await = unit.working;
        Ok(())
    }
}
