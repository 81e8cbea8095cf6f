//! Adjustment ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchwise_core::{AdjustmentCategory, AdjustmentId, ProductId};

/// An immutable record of a stock-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: AdjustmentId,
    pub product_id: ProductId,
    pub category: AdjustmentCategory,
    /// Aggregate stock before the event.
    pub quantity_before: i32,
    /// Aggregate stock after the event.
    pub quantity_after: i32,
    /// `quantity_after - quantity_before`.
    pub difference: i32,
    pub note: String,
    /// Who performed the change.
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry to append.
#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub product_id: ProductId,
    pub category: AdjustmentCategory,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub note: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl NewAdjustment {
    /// Signed change in aggregate stock.
    #[must_use]
    pub const fn difference(&self) -> i32 {
        self.quantity_after - self.quantity_before
    }
}

/// Outcome of reconciling one product's aggregate against its batches.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub product_id: ProductId,
    /// Aggregate stock before reconciliation.
    pub previous_stock: i32,
    /// Sum of live batch quantities, now the stored aggregate.
    pub batch_total: i32,
    /// Correction entry, present only when the aggregate changed.
    pub adjustment: Option<Adjustment>,
}

impl Reconciliation {
    /// Whether the stored aggregate had drifted.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous_stock != self.batch_total
    }
}
