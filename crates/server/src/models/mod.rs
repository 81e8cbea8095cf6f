//! Domain models for the batch inventory.
//!
//! - [`product`] - Products and their aggregate stock
//! - [`batch`] - Receipt batches, consumption receipts and radar rows
//! - [`adjustment`] - Immutable adjustment ledger entries

pub mod adjustment;
pub mod batch;
pub mod product;

pub use adjustment::{Adjustment, NewAdjustment, Reconciliation};
pub use batch::{
    Batch, BatchConsumption, BatchWithProduct, ConsumptionReceipt, ExpiringBatch, NewBatch,
    RestockInput,
};
pub use product::{CreateProductInput, NewProduct, Product, ProductCreated, ProductSummary};
