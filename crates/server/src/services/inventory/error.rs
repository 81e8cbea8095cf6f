//! Errors raised by the inventory engine.

use thiserror::Error;

use batchwise_core::{BatchId, ProductId};

use crate::db::RepositoryError;

/// Errors that can occur during inventory operations.
///
/// Nothing is written when any of these is returned; every mutation runs in a
/// single unit of work that is rolled back on failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before touching the store.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown product ID.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Unknown or already exhausted batch ID.
    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    /// The product exists but has no live batches to draw from.
    #[error("product {0} has no batches to draw from")]
    Unavailable(ProductId),

    /// Live batches cannot cover the requested quantity.
    #[error(
        "insufficient batch stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i64,
    },

    /// The stored aggregate disagrees with the batch ledger in a way that
    /// blocks the operation. The aggregate has been reconciled; the operation
    /// was not applied.
    #[error(
        "stock aggregate for product {product_id} is inconsistent: stock {stock}, batch total {batch_total}"
    )]
    Consistency {
        product_id: ProductId,
        stock: i32,
        batch_total: i64,
    },

    /// Storage failure.
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
