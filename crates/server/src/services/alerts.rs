//! Expiry alerts.
//!
//! Runs the expiry radar and reports batches that entered an alert band.
//! Each (batch, band) pair is raised once per suppression window; a batch that
//! moves into a more severe band is raised again.

use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use serde::Serialize;
use tracing::{info, warn};

use batchwise_core::{BatchId, ExpiryBand, ProductId};

use super::inventory::{EngineError, InventoryEngine};

/// Upper bound on remembered (batch, band) pairs.
const MAX_TRACKED_ALERTS: u64 = 10_000;

/// A batch that needs attention before it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryAlert {
    pub batch_id: BatchId,
    pub batch_code: String,
    pub product_id: ProductId,
    pub product_title: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub band: ExpiryBand,
}

/// Raises expiry alerts, suppressing repeats within a time window.
#[derive(Clone)]
pub struct ExpiryAlerter {
    engine: InventoryEngine,
    horizon_days: i64,
    raised: Cache<(BatchId, ExpiryBand), ()>,
}

impl std::fmt::Debug for ExpiryAlerter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryAlerter")
            .field("horizon_days", &self.horizon_days)
            .field("tracked", &self.raised.entry_count())
            .finish_non_exhaustive()
    }
}

impl ExpiryAlerter {
    /// Create an alerter looking `horizon_days` ahead and suppressing repeats
    /// for `suppression`.
    #[must_use]
    pub fn new(engine: InventoryEngine, horizon_days: i64, suppression: Duration) -> Self {
        let raised = Cache::builder()
            .max_capacity(MAX_TRACKED_ALERTS)
            .time_to_live(suppression)
            .build();

        Self {
            engine,
            horizon_days,
            raised,
        }
    }

    /// Run the radar and return alerts not raised within the suppression window.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the radar read fails.
    pub async fn scan(&self) -> Result<Vec<ExpiryAlert>, EngineError> {
        let hits = self.engine.expiring(self.horizon_days).await?;

        let mut alerts = Vec::new();
        for hit in hits {
            let Some(band) = hit.band else {
                continue;
            };

            let fresh = self
                .raised
                .entry((hit.batch.id, band))
                .or_insert(())
                .await
                .is_fresh();
            if !fresh {
                continue;
            }

            warn!(
                batch_code = %hit.batch.batch_code,
                product = %hit.product.title,
                quantity = hit.batch.quantity,
                days_until_expiry = hit.days_until_expiry,
                band = %band,
                "Batch nearing expiry"
            );
            alerts.push(ExpiryAlert {
                batch_id: hit.batch.id,
                batch_code: hit.batch.batch_code,
                product_id: hit.product.id,
                product_title: hit.product.title,
                quantity: hit.batch.quantity,
                expiry_date: hit.batch.expiry_date,
                days_until_expiry: hit.days_until_expiry,
                band,
            });
        }

        info!(raised = alerts.len(), "Expiry scan complete");
        Ok(alerts)
    }

    /// Forget every raised alert so the next scan reports all of them.
    pub async fn reset(&self) {
        self.raised.invalidate_all();
        self.raised.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone, Utc};

    use crate::db::memory::MemoryInventoryStore;
    use crate::models::{CreateProductInput, RestockInput};
    use crate::services::clock::{Clock, ManualClock};
    use crate::services::inventory::EngineSettings;

    async fn setup(expiry_in_days: &[i64]) -> (ExpiryAlerter, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2025, 12, 15, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let engine = InventoryEngine::new(
            Arc::new(MemoryInventoryStore::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            EngineSettings::default(),
        );

        let product = engine
            .create_product(
                CreateProductInput {
                    title: "Leche Entera".to_owned(),
                    unit_price: rust_decimal::Decimal::ONE,
                    unit: "l".to_owned(),
                    category: None,
                    starting_stock: 0,
                    starting_expiry: None,
                },
                "test",
            )
            .await
            .unwrap()
            .product;
        for days in expiry_in_days {
            engine
                .restock(
                    product.id,
                    RestockInput {
                        quantity: 2,
                        expiry_date: start.date_naive() + TimeDelta::days(*days),
                        note: None,
                    },
                    "test",
                )
                .await
                .unwrap();
        }

        let alerter = ExpiryAlerter::new(engine, 30, Duration::from_secs(3600));
        (alerter, clock)
    }

    #[tokio::test]
    async fn test_scan_suppresses_repeats() {
        let (alerter, _clock) = setup(&[3, 12, 25, 45]).await;

        let first = alerter.scan().await.unwrap();
        assert_eq!(
            first.iter().map(|a| a.band).collect::<Vec<_>>(),
            vec![ExpiryBand::Critical, ExpiryBand::Urgent, ExpiryBand::Caution]
        );
        assert_eq!(first[0].product_title, "Leche Entera");

        assert!(alerter.scan().await.unwrap().is_empty());

        alerter.reset().await;
        assert_eq!(alerter.scan().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_band_escalation_is_raised_again() {
        let (alerter, clock) = setup(&[8]).await;

        let first = alerter.scan().await.unwrap();
        assert_eq!(first[0].band, ExpiryBand::Urgent);

        clock.advance(TimeDelta::days(1));
        let escalated = alerter.scan().await.unwrap();
        assert_eq!(escalated.len(), 1);
        assert_eq!(escalated[0].band, ExpiryBand::Critical);
        assert_eq!(escalated[0].days_until_expiry, 7);
    }
}
