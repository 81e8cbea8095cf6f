//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::InventoryConfig;
use crate::db::InventoryStore;
use crate::services::{Clock, ExpiryAlerter, InventoryEngine};

/// Application state shared across all handlers.
///
/// Cheaply cloneable; everything lives behind one `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    engine: InventoryEngine,
    alerter: ExpiryAlerter,
    inventory: InventoryConfig,
}

impl AppState {
    /// Build the engine and alerter over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        inventory: InventoryConfig,
    ) -> Self {
        let engine = InventoryEngine::new(store, clock, inventory.engine_settings());
        let alerter = ExpiryAlerter::new(
            engine.clone(),
            inventory.alert_horizon_days,
            inventory.alert_suppression,
        );

        Self {
            inner: Arc::new(AppStateInner {
                engine,
                alerter,
                inventory,
            }),
        }
    }

    /// The inventory engine.
    #[must_use]
    pub fn engine(&self) -> &InventoryEngine {
        &self.inner.engine
    }

    /// The expiry alerter.
    #[must_use]
    pub fn alerter(&self) -> &ExpiryAlerter {
        &self.inner.alerter
    }

    /// Inventory policy the state was built with.
    #[must_use]
    pub fn inventory_config(&self) -> &InventoryConfig {
        &self.inner.inventory
    }
}
