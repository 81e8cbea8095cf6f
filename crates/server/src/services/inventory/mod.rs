//! Batch inventory engine.
//!
//! Stock is held in receipt batches, each with its own expiry date. The
//! per-product aggregate is a cache of the live batch total, kept in step by
//! every mutation and repaired by reconciliation.
//!
//! - `engine` - [`InventoryEngine`], the only writer of stock
//! - `fifo` - pure expiry-ordered consumption planning
//! - `ledger` - adjustment entries written alongside every aggregate change

mod engine;
mod error;
pub mod fifo;
mod ledger;

pub use engine::{EngineSettings, InventoryEngine};
pub use error::EngineError;
pub use ledger::{ANONYMOUS_ACTOR, RECONCILE_NOTE, SYSTEM_ACTOR};
