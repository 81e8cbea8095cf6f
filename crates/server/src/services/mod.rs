//! Business logic services.
//!
//! # Services
//!
//! - `alerts` - Expiry alerts with per-band suppression
//! - `clock` - Injectable time source
//! - `inventory` - Batch inventory engine (FIFO consumption, restock, ledger)

pub mod alerts;
pub mod clock;
pub mod inventory;

pub use alerts::{ExpiryAlert, ExpiryAlerter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use inventory::{EngineError, EngineSettings, InventoryEngine};
