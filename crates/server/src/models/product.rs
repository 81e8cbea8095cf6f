//! Product domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use batchwise_core::ProductId;

use super::batch::Batch;

/// A product whose stock is tracked in receipt batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title, also the source of batch code prefixes.
    pub title: String,
    /// Price of one unit.
    pub unit_price: Decimal,
    /// Unit of measure (e.g. "kg", "unit").
    pub unit: String,
    /// Optional reporting category.
    pub category: Option<String>,
    /// Aggregate stock; cached sum of live batch quantities.
    pub stock: i32,
    /// Starting quantity requested at creation (reporting only).
    pub initial_stock: i32,
    /// Number of batches ever created for this product.
    pub batch_sequence: i32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Difference between current stock and the creation snapshot.
    #[must_use]
    pub const fn drift_from_initial(&self) -> i32 {
        self.stock - self.initial_stock
    }

    /// Short form used when joining products onto other records.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// Product fields carried alongside batches in radar results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub category: Option<String>,
    pub unit: String,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    /// Display title.
    pub title: String,
    /// Price of one unit.
    #[serde(default)]
    pub unit_price: Decimal,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Optional reporting category.
    #[serde(default)]
    pub category: Option<String>,
    /// Units on hand at creation; received as the first batch.
    #[serde(default)]
    pub starting_stock: i32,
    /// Expiry of the starting batch. Defaults to the configured shelf life.
    #[serde(default)]
    pub starting_expiry: Option<NaiveDate>,
}

fn default_unit() -> String {
    "unit".to_owned()
}

/// Row to insert for a new product. Stock always starts at zero.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub unit_price: Decimal,
    pub unit: String,
    pub category: Option<String>,
    pub initial_stock: i32,
    pub created_at: DateTime<Utc>,
}

/// Result of product creation.
///
/// The starting batch is absent when no starting stock was given or when
/// receiving it failed; product creation is never rolled back for the latter.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCreated {
    pub product: Product,
    pub starting_batch: Option<Batch>,
}
