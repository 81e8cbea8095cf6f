//! Engine tests against a real `PostgreSQL` database.
//!
//! Requires a migrated database at `BATCHWISE_TEST_DATABASE_URL`:
//!
//! ```bash
//! BATCHWISE_DATABASE_URL=$BATCHWISE_TEST_DATABASE_URL batchwise migrate
//! cargo test -p batchwise-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use batchwise_core::{AdjustmentCategory, ProductId};
use batchwise_server::db::{self, postgres::PgInventoryStore};
use batchwise_server::models::{CreateProductInput, RestockInput};
use batchwise_server::services::{
    Clock, EngineError, EngineSettings, InventoryEngine, ManualClock,
};

async fn engine() -> (InventoryEngine, Arc<ManualClock>) {
    let url = std::env::var("BATCHWISE_TEST_DATABASE_URL")
        .expect("BATCHWISE_TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let engine = InventoryEngine::new(
        Arc::new(PgInventoryStore::new(pool)),
        Arc::clone(&clock) as Arc<dyn Clock>,
        EngineSettings::default(),
    );
    (engine, clock)
}

async fn product(engine: &InventoryEngine, title: &str) -> ProductId {
    engine
        .create_product(
            CreateProductInput {
                title: format!("{title} {}", Utc::now().timestamp_micros()),
                unit_price: Decimal::new(199, 2),
                unit: "unit".to_owned(),
                category: Some("test".to_owned()),
                starting_stock: 0,
                starting_expiry: None,
            },
            "pg-test",
        )
        .await
        .unwrap()
        .product
        .id
}

async fn restock(engine: &InventoryEngine, id: ProductId, quantity: i32, days: i64) {
    engine
        .restock(
            id,
            RestockInput {
                quantity,
                expiry_date: engine.today() + TimeDelta::days(days),
                note: None,
            },
            "pg-test",
        )
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL (BATCHWISE_TEST_DATABASE_URL)"]
async fn test_pg_consume_follows_expiry_order() {
    let (engine, _clock) = engine().await;
    let id = product(&engine, "Harina").await;
    restock(&engine, id, 10, 20).await;
    restock(&engine, id, 5, 2).await;

    let receipt = engine.consume(id, 8, None, "pg-test").await.unwrap();

    let drawn: Vec<i32> = receipt.allocations.iter().map(|a| a.units_consumed).collect();
    assert_eq!(drawn, vec![5, 3]);
    assert_eq!(receipt.adjustment.category, AdjustmentCategory::Consumption);

    let batches = engine.list_batches(id).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].quantity, 7);
    assert_eq!(engine.get_product(id).await.unwrap().stock, 7);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL (BATCHWISE_TEST_DATABASE_URL)"]
async fn test_pg_failed_consumption_rolls_back() {
    let (engine, _clock) = engine().await;
    let id = product(&engine, "Avena").await;
    restock(&engine, id, 4, 10).await;

    let err = engine.consume(id, 9, None, "pg-test").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock {
            requested: 9,
            available: 4,
            ..
        }
    ));

    assert_eq!(engine.get_product(id).await.unwrap().stock, 4);
    assert_eq!(engine.list_batches(id).await.unwrap()[0].quantity, 4);
    assert_eq!(engine.history(id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL (BATCHWISE_TEST_DATABASE_URL)"]
async fn test_pg_concurrent_consumptions_never_oversell() {
    let (engine, _clock) = engine().await;
    let id = product(&engine, "Lentejas").await;
    restock(&engine, id, 12, 5).await;
    restock(&engine, id, 8, 9).await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.consume(id, 3, None, "pg-test").await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 6);
    let product = engine.get_product(id).await.unwrap();
    let batch_total: i32 = engine
        .list_batches(id)
        .await
        .unwrap()
        .iter()
        .map(|b| b.quantity)
        .sum();
    assert_eq!(product.stock, 2);
    assert_eq!(batch_total, 2);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL (BATCHWISE_TEST_DATABASE_URL)"]
async fn test_pg_radar_and_reconcile() {
    let (engine, _clock) = engine().await;
    let id = product(&engine, "Mantequilla").await;
    restock(&engine, id, 3, 30).await;
    restock(&engine, id, 3, 31).await;

    let hits: Vec<_> = engine
        .expiring(30)
        .await
        .unwrap()
        .into_iter()
        .filter(|hit| hit.product.id == id)
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].days_until_expiry, 30);

    engine.correct(id, 1, Some("miscount"), "pg-test").await.unwrap();
    let reconciliation = engine.reconcile(id).await.unwrap();
    assert!(reconciliation.changed());
    assert_eq!(reconciliation.batch_total, 6);
    assert_eq!(engine.get_product(id).await.unwrap().stock, 6);
}
