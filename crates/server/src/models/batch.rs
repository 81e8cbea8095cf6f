//! Batch domain models: receipts of a product with their own expiry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use batchwise_core::{BatchId, ExpiryBand, ProductId};

use super::adjustment::Adjustment;
use super::product::ProductSummary;

/// A live batch of a product.
///
/// Exhausted batches are deleted, so a stored batch always has
/// `quantity > 0` once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch ID.
    pub id: BatchId,
    /// Product this batch belongs to.
    pub product_id: ProductId,
    /// Human-readable code, unique within the product.
    pub batch_code: String,
    /// Units remaining.
    pub quantity: i32,
    /// Date the batch expires.
    pub expiry_date: NaiveDate,
    /// When the batch was received; FIFO tie-break.
    pub created_at: DateTime<Utc>,
}

/// Row to insert for a new batch.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub product_id: ProductId,
    pub batch_code: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for receiving a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RestockInput {
    /// Units received.
    pub quantity: i32,
    /// Expiry date; must be after today.
    pub expiry_date: NaiveDate,
    /// Optional free-text note for the ledger.
    #[serde(default)]
    pub note: Option<String>,
}

/// Units taken from one batch during a consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConsumption {
    pub batch_id: BatchId,
    pub batch_code: String,
    pub units_consumed: i32,
}

/// Outcome of a FIFO consumption.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionReceipt {
    /// Batches drawn from, in the order they were consumed.
    pub allocations: Vec<BatchConsumption>,
    /// The ledger entry written for the consumption.
    pub adjustment: Adjustment,
}

impl ConsumptionReceipt {
    /// Total units drawn across all batches.
    #[must_use]
    pub fn total_consumed(&self) -> i32 {
        self.allocations.iter().map(|a| a.units_consumed).sum()
    }
}

/// A batch joined with its product, as read by the expiry radar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWithProduct {
    pub batch: Batch,
    pub product: ProductSummary,
}

/// A radar hit: a live batch expiring within the requested horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringBatch {
    #[serde(flatten)]
    pub batch: Batch,
    pub product: ProductSummary,
    /// Whole days from today until expiry (0 = expires today).
    pub days_until_expiry: i64,
    /// Presentation band, if within 30 days.
    pub band: Option<ExpiryBand>,
}
