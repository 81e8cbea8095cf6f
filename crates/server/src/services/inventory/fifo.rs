//! Expiry-ordered (FIFO) consumption planning.
//!
//! Planning is pure: it decides which batches to draw from without touching
//! the store. The engine applies a plan only when it covers the whole request.

use std::cmp::Ordering;

use batchwise_core::BatchId;

use crate::models::{Batch, BatchConsumption};

/// Units to take from one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDraw {
    pub batch_id: BatchId,
    pub batch_code: String,
    /// Units taken from the batch.
    pub take: i32,
    /// Units left in the batch afterwards; zero means the batch is exhausted.
    pub remaining: i32,
}

impl PlannedDraw {
    /// Whether the draw empties the batch.
    #[must_use]
    pub const fn exhausts_batch(&self) -> bool {
        self.remaining == 0
    }
}

impl From<&PlannedDraw> for BatchConsumption {
    fn from(draw: &PlannedDraw) -> Self {
        Self {
            batch_id: draw.batch_id,
            batch_code: draw.batch_code.clone(),
            units_consumed: draw.take,
        }
    }
}

/// Live batches cannot cover the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub requested: i32,
    pub available: i64,
}

/// FIFO order: soonest expiry first, then oldest receipt, then lowest ID.
#[must_use]
pub fn fifo_cmp(a: &Batch, b: &Batch) -> Ordering {
    a.expiry_date
        .cmp(&b.expiry_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Plan drawing `quantity` units from `batches`.
///
/// Batches are visited in FIFO order regardless of input order; exhausted
/// batches are skipped.
///
/// # Errors
///
/// Returns [`Shortfall`] when the live batches hold fewer than `quantity`
/// units in total.
pub fn plan_consumption(batches: &[Batch], quantity: i32) -> Result<Vec<PlannedDraw>, Shortfall> {
    let mut ordered: Vec<&Batch> = batches.iter().filter(|b| b.quantity > 0).collect();
    ordered.sort_by(|a, b| fifo_cmp(a, b));

    let mut draws = Vec::new();
    let mut still_needed = quantity;

    for batch in ordered {
        if still_needed <= 0 {
            break;
        }
        let take = batch.quantity.min(still_needed);
        still_needed -= take;
        draws.push(PlannedDraw {
            batch_id: batch.id,
            batch_code: batch.batch_code.clone(),
            take,
            remaining: batch.quantity - take,
        });
    }

    if still_needed > 0 {
        return Err(Shortfall {
            requested: quantity,
            available: batches
                .iter()
                .filter(|b| b.quantity > 0)
                .map(|b| i64::from(b.quantity))
                .sum(),
        });
    }

    Ok(draws)
}

/// Ledger note listing every batch touched, e.g. `Az-1-15122025 x5, Az-2-20122025 x3`.
#[must_use]
pub fn describe_draws(draws: &[PlannedDraw]) -> String {
    draws
        .iter()
        .map(|d| format!("{} x{}", d.batch_code, d.take))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use batchwise_core::ProductId;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn batch(id: i32, quantity: i32, expiry_day: u32, received_hour: u32) -> Batch {
        Batch {
            id: BatchId::new(id),
            product_id: ProductId::new(1),
            batch_code: format!("Te-{id}-01012026"),
            quantity,
            expiry_date: NaiveDate::from_ymd_opt(2026, 1, expiry_day).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 12, 1, received_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_soonest_expiry_is_drawn_first() {
        let batches = vec![batch(3, 10, 20, 0), batch(1, 5, 2, 0), batch(2, 10, 10, 0)];
        let draws = plan_consumption(&batches, 4).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].batch_id, BatchId::new(1));
        assert_eq!(draws[0].take, 4);
        assert_eq!(draws[0].remaining, 1);
    }

    #[test]
    fn test_spills_into_next_batch() {
        let batches = vec![batch(1, 5, 2, 0), batch(2, 10, 20, 0)];
        let draws = plan_consumption(&batches, 8).unwrap();
        assert_eq!(
            draws.iter().map(|d| (d.batch_id.as_i32(), d.take)).collect::<Vec<_>>(),
            vec![(1, 5), (2, 3)]
        );
        assert!(draws[0].exhausts_batch());
        assert!(!draws[1].exhausts_batch());
    }

    #[test]
    fn test_same_expiry_uses_receipt_order() {
        let batches = vec![batch(1, 5, 5, 10), batch(2, 5, 5, 8)];
        let draws = plan_consumption(&batches, 3).unwrap();
        assert_eq!(draws[0].batch_id, BatchId::new(2));
    }

    #[test]
    fn test_shortfall_reports_available() {
        let batches = vec![batch(1, 5, 2, 0), batch(2, 4, 20, 0), batch(3, 0, 1, 0)];
        let shortfall = plan_consumption(&batches, 12).unwrap_err();
        assert_eq!(
            shortfall,
            Shortfall {
                requested: 12,
                available: 9
            }
        );
    }

    #[test]
    fn test_exact_total_exhausts_everything() {
        let batches = vec![batch(1, 5, 2, 0), batch(2, 4, 20, 0)];
        let draws = plan_consumption(&batches, 9).unwrap();
        assert!(draws.iter().all(PlannedDraw::exhausts_batch));
    }

    #[test]
    fn test_describe_draws() {
        let batches = vec![batch(1, 5, 2, 0), batch(2, 10, 20, 0)];
        let draws = plan_consumption(&batches, 8).unwrap();
        assert_eq!(describe_draws(&draws), "Te-1-01012026 x5, Te-2-01012026 x3");
    }
}
