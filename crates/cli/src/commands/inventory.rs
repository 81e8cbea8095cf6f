//! Stock operation commands.

use chrono::NaiveDate;
use tracing::info;

use batchwise_core::ProductId;
use batchwise_server::models::RestockInput;

/// Receive a new batch.
///
/// # Errors
///
/// Returns an error if the restock is rejected or the database fails.
pub async fn restock(
    product_id: ProductId,
    quantity: i32,
    expiry_date: NaiveDate,
    note: Option<String>,
    actor: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;
    let batch = engine
        .restock(
            product_id,
            RestockInput {
                quantity,
                expiry_date,
                note,
            },
            actor,
        )
        .await?;

    info!(
        batch_id = %batch.id,
        "Received batch {} ({} units, expires {})",
        batch.batch_code, batch.quantity, batch.expiry_date
    );
    Ok(())
}

/// Consume stock, soonest expiry first.
///
/// # Errors
///
/// Returns an error if the consumption is rejected or the database fails.
pub async fn consume(
    product_id: ProductId,
    quantity: i32,
    note: Option<&str>,
    actor: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;
    let receipt = engine.consume(product_id, quantity, note, actor).await?;

    for allocation in &receipt.allocations {
        info!("  {} x{}", allocation.batch_code, allocation.units_consumed);
    }
    info!(
        "Consumed {} units; stock now {}",
        receipt.total_consumed(),
        receipt.adjustment.quantity_after
    );
    Ok(())
}

/// Reconcile one product, or every product.
///
/// # Errors
///
/// Returns an error if the product doesn't exist or the database fails.
pub async fn reconcile(product_id: Option<ProductId>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;

    let repaired = match product_id {
        Some(id) => {
            let reconciliation = engine.reconcile(id).await?;
            if reconciliation.changed() {
                vec![reconciliation]
            } else {
                info!(product_id = %id, stock = reconciliation.batch_total, "Stock already matches batches");
                Vec::new()
            }
        }
        None => engine.reconcile_all().await?,
    };

    for r in &repaired {
        info!(
            product_id = %r.product_id,
            "Stock {} -> {}",
            r.previous_stock, r.batch_total
        );
    }
    info!("Reconciled {} products", repaired.len());
    Ok(())
}

/// List batches expiring within `days`.
///
/// # Errors
///
/// Returns an error if `days` is negative or the database fails.
pub async fn expiring(days: i64) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;
    let hits = engine.expiring(days).await?;

    info!("{} batches expiring within {days} days", hits.len());
    for hit in &hits {
        let band = hit.band.map_or("-", |b| b.as_str());
        info!(
            "  [{band}] {} {} x{} expires {} ({} days)",
            hit.product.title,
            hit.batch.batch_code,
            hit.batch.quantity,
            hit.batch.expiry_date,
            hit.days_until_expiry
        );
    }
    Ok(())
}

/// Show a product's ledger, newest first.
///
/// # Errors
///
/// Returns an error if the product doesn't exist or the database fails.
pub async fn history(product_id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;
    let product = engine.get_product(product_id).await?;
    let entries = engine.history(product_id).await?;

    info!("{} (stock {})", product.title, product.stock);
    for entry in &entries {
        info!(
            "  {} {:<11} {:>6} -> {:<6} ({:+}) {} [{}]",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.category,
            entry.quantity_before,
            entry.quantity_after,
            entry.difference,
            entry.note,
            entry.actor
        );
    }
    Ok(())
}

/// Purge old ledger entries.
///
/// # Errors
///
/// Returns an error if `days` is negative or the database fails.
pub async fn purge(days: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::engine().await?;
    let purged = engine.purge_adjustments(days).await?;

    info!("Purged {purged} adjustment entries");
    Ok(())
}
