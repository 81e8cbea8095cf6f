//! Adjustment ledger writes.
//!
//! The aggregate stock column is only ever written through [`StockChange`],
//! which appends the matching ledger entry in the same unit of work.

use chrono::{DateTime, Utc};

use batchwise_core::AdjustmentCategory;

use crate::db::{InventoryUnit, RepositoryError};
use crate::models::{Adjustment, NewAdjustment, Product};

/// Note written when reconciliation repairs an aggregate.
pub const RECONCILE_NOTE: &str = "reconciled from batch ledger";

/// Actor recorded for changes the engine makes on its own.
pub const SYSTEM_ACTOR: &str = "system";

/// Actor recorded when the caller doesn't identify itself.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// A change to one product's aggregate stock.
pub(super) struct StockChange<'a> {
    pub product: &'a Product,
    pub category: AdjustmentCategory,
    pub quantity_after: i32,
    pub note: String,
    pub actor: &'a str,
    pub at: DateTime<Utc>,
}

impl StockChange<'_> {
    /// Write the new aggregate and its ledger entry.
    pub(super) async fn apply(
        self,
        unit: &mut dyn InventoryUnit,
    ) -> Result<Adjustment, RepositoryError> {
        unit.set_product_stock(self.product.id, self.quantity_after, self.at)
            .await?;

        unit.insert_adjustment(&NewAdjustment {
            product_id: self.product.id,
            category: self.category,
            quantity_before: self.product.stock,
            quantity_after: self.quantity_after,
            note: self.note,
            actor: normalize_actor(self.actor),
            created_at: self.at,
        })
        .await
    }
}

fn normalize_actor(actor: &str) -> String {
    let actor = actor.trim();
    if actor.is_empty() {
        ANONYMOUS_ACTOR.to_owned()
    } else {
        actor.to_owned()
    }
}

/// Join the engine's summary with an optional caller note.
pub(super) fn compose_note(summary: String, extra: Option<&str>) -> String {
    match extra.map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("{summary}: {extra}"),
        _ => summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_actor_becomes_anonymous() {
        assert_eq!(normalize_actor("  "), ANONYMOUS_ACTOR);
        assert_eq!(normalize_actor(" maria "), "maria");
    }

    #[test]
    fn test_compose_note() {
        assert_eq!(
            compose_note("consumed Az-1-15122025 x2".to_owned(), Some(" sale #12 ")),
            "consumed Az-1-15122025 x2: sale #12"
        );
        assert_eq!(compose_note("manual correction".to_owned(), Some("")), "manual correction");
        assert_eq!(compose_note("manual correction".to_owned(), None), "manual correction");
    }
}
