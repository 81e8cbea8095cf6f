//! HTTP tests for the inventory API over the in-memory store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use batchwise_core::ProductId;
use batchwise_integration_tests::{TestApp, date_in};

async fn create_product(app: &TestApp, title: &str, starting_stock: i32) -> Value {
    let (status, body) = app
        .send_as(
            "POST",
            "/products",
            Some(json!({
                "title": title,
                "unit_price": "2.50",
                "unit": "kg",
                "starting_stock": starting_stock,
            })),
            Some("maria"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn restock(app: &TestApp, product_id: i64, quantity: i32, days: i64) -> Value {
    let (status, body) = app
        .send(
            "POST",
            &format!("/products/{product_id}/batches"),
            Some(json!({ "quantity": quantity, "expiry_date": date_in(days) })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));

    let (status, _) = app.send("GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_create_product_with_starting_stock() {
    let app = TestApp::new();

    let created = create_product(&app, "Arroz Premium Blanco", 40).await;

    assert_eq!(created["product"]["stock"], 40);
    assert_eq!(created["product"]["initial_stock"], 40);
    assert_eq!(created["product"]["unit_price"], "2.50");
    assert_eq!(created["starting_batch"]["batch_code"], "ArrPreBl-1-15122025");
    assert_eq!(created["starting_batch"]["expiry_date"], date_in(365));

    let id = created["product"]["id"].as_i64().unwrap();
    let (status, history) = app
        .send("GET", &format!("/products/{id}/adjustments"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["category"], "restock");
    assert_eq!(history[0]["actor"], "maria");
}

#[tokio::test]
async fn test_list_and_show_products() {
    let app = TestApp::new();
    create_product(&app, "Queso Fresco", 0).await;
    let azucar = create_product(&app, "Azúcar", 0).await;

    let (status, list) = app.send("GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Azúcar", "Queso Fresco"]);

    let id = azucar["product"]["id"].as_i64().unwrap();
    let (status, product) = app.send("GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["title"], "Azúcar");

    let (status, body) = app.send("GET", "/products/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_create_product_rejects_empty_title() {
    let app = TestApp::new();

    let (status, body) = app
        .send("POST", "/products", Some(json!({ "title": "  " })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

// =============================================================================
// Stock movements
// =============================================================================

#[tokio::test]
async fn test_consume_draws_soonest_expiry_first() {
    let app = TestApp::new();
    let product = create_product(&app, "Arroz Premium Blanco", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    let b1 = restock(&app, id, 5, 2).await;
    let b2 = restock(&app, id, 10, 20).await;

    let (status, receipt) = app
        .send_as(
            "POST",
            &format!("/products/{id}/consume"),
            Some(json!({ "quantity": 8, "note": "order #1042" })),
            Some("till-2"),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(
        receipt["allocations"],
        json!([
            { "batch_id": b1["id"], "batch_code": b1["batch_code"], "units_consumed": 5 },
            { "batch_id": b2["id"], "batch_code": b2["batch_code"], "units_consumed": 3 },
        ])
    );
    assert_eq!(receipt["adjustment"]["category"], "consumption");
    assert_eq!(receipt["adjustment"]["difference"], -8);
    assert_eq!(receipt["adjustment"]["actor"], "till-2");

    let (_, batches) = app
        .send("GET", &format!("/products/{id}/batches"), None)
        .await;
    let batches = batches.as_array().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["id"], b2["id"]);
    assert_eq!(batches[0]["quantity"], 7);
}

#[tokio::test]
async fn test_over_consumption_is_conflict_with_quantities() {
    let app = TestApp::new();
    let product = create_product(&app, "Aceite", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    restock(&app, id, 5, 10).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/products/{id}/consume"),
            Some(json!({ "quantity": 9 })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["requested"], 9);
    assert_eq!(body["available"], 5);

    let (_, product) = app.send("GET", &format!("/products/{id}"), None).await;
    assert_eq!(product["stock"], 5);
}

#[tokio::test]
async fn test_consume_without_batches_is_unavailable() {
    let app = TestApp::new();
    let product = create_product(&app, "Sal", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/products/{id}/consume"),
            Some(json!({ "quantity": 1 })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "unavailable");
}

#[tokio::test]
async fn test_restock_rejects_past_expiry() {
    let app = TestApp::new();
    let product = create_product(&app, "Leche", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/products/{id}/batches"),
            Some(json!({ "quantity": 3, "expiry_date": date_in(0) })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_correction_and_reconcile() {
    let app = TestApp::new();
    let product = create_product(&app, "Cafe", 12).await;
    let id = product["product"]["id"].as_i64().unwrap();

    let (status, correction) = app
        .send(
            "POST",
            &format!("/products/{id}/correction"),
            Some(json!({ "quantity": 9, "note": "shelf count" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(correction["category"], "correction");
    assert_eq!(correction["actor"], "anonymous");
    assert_eq!(correction["difference"], -3);

    let (status, reconciliation) = app
        .send("POST", &format!("/products/{id}/reconcile"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reconciliation["previous_stock"], 9);
    assert_eq!(reconciliation["batch_total"], 12);
    assert_eq!(reconciliation["adjustment"]["note"], "reconciled from batch ledger");
    assert_eq!(reconciliation["adjustment"]["actor"], "system");

    let (_, again) = app
        .send("POST", &format!("/products/{id}/reconcile"), None)
        .await;
    assert_eq!(again["adjustment"], Value::Null);
}

#[tokio::test]
async fn test_delete_batch() {
    let app = TestApp::new();
    let product = create_product(&app, "Tomate", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    let spoiled = restock(&app, id, 6, 4).await;
    restock(&app, id, 4, 9).await;
    let batch_id = spoiled["id"].as_i64().unwrap();

    let (status, entry) = app
        .send("DELETE", &format!("/batches/{batch_id}?note=mould"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["category"], "deletion");
    assert_eq!(entry["quantity_after"], 4);

    let (status, _) = app
        .send("DELETE", &format!("/batches/{batch_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Reporting
// =============================================================================

#[tokio::test]
async fn test_expiring_radar_boundaries() {
    let app = TestApp::new();
    let product = create_product(&app, "Yogur", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    restock(&app, id, 1, 5).await;
    restock(&app, id, 1, 10).await;
    restock(&app, id, 1, 11).await;

    let (status, hits) = app.send("GET", "/expiring?days=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["days_until_expiry"], 5);
    assert_eq!(hits[0]["band"], "critical");
    assert_eq!(hits[1]["days_until_expiry"], 10);
    assert_eq!(hits[1]["band"], "urgent");
    assert_eq!(hits[1]["product"]["title"], "Yogur");

    let (status, body) = app.send("GET", "/expiring?days=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_expiry_alerts_are_suppressed() {
    let app = TestApp::new();
    let product = create_product(&app, "Pan", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    restock(&app, id, 3, 6).await;
    restock(&app, id, 3, 60).await;

    let (status, alerts) = app.send("GET", "/alerts/expiry", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["band"], "critical");
    assert_eq!(alerts[0]["product_title"], "Pan");

    let (_, again) = app.send("GET", "/alerts/expiry", None).await;
    assert!(again.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recent_adjustments_and_purge() {
    let app = TestApp::new();
    let product = create_product(&app, "Galletas", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    restock(&app, id, 5, 900).await;
    app.clock.advance(chrono::TimeDelta::days(400));
    restock(&app, id, 5, 900).await;

    let (status, recent) = app.send("GET", "/adjustments/recent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 1);

    let (status, purge) = app
        .send("POST", "/maintenance/purge-adjustments", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purge["purged"], 1);
    assert_eq!(purge["older_than_days"], 365);

    let (_, recent) = app.send("GET", "/adjustments/recent?days=1000", None).await;
    assert_eq!(recent.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_maintenance_reconcile_repairs_drift() {
    let app = TestApp::new();
    let product = create_product(&app, "Miel", 8).await;
    let id = product["product"]["id"].as_i64().unwrap();
    app.store
        .overwrite_stock_unrecorded(ProductId::new(i32::try_from(id).unwrap()), 20)
        .await
        .unwrap();

    let (status, repaired) = app.send("POST", "/maintenance/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    let repaired = repaired.as_array().unwrap();
    assert_eq!(repaired.len(), 1);
    assert_eq!(repaired[0]["previous_stock"], 20);
    assert_eq!(repaired[0]["batch_total"], 8);

    let (_, product) = app.send("GET", &format!("/products/{id}"), None).await;
    assert_eq!(product["stock"], 8);
}

#[tokio::test]
async fn test_consistency_error_hides_details() {
    let app = TestApp::new();
    let product = create_product(&app, "Jamon", 10).await;
    let id = product["product"]["id"].as_i64().unwrap();
    app.store
        .overwrite_stock_unrecorded(ProductId::new(i32::try_from(id).unwrap()), 1)
        .await
        .unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/products/{id}/consume"),
            Some(json!({ "quantity": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "consistency_error");
    assert_eq!(body["message"], "Internal server error");

    let (_, product) = app.send("GET", &format!("/products/{id}"), None).await;
    assert_eq!(product["stock"], 10);
}

#[tokio::test]
async fn test_maintenance_reconcile_keeps_untracked_stock() {
    let app = TestApp::new();
    let product = create_product(&app, "Sal Gruesa", 0).await;
    let id = product["product"]["id"].as_i64().unwrap();
    let (status, _) = app
        .send(
            "POST",
            &format!("/products/{id}/correction"),
            Some(json!({ "quantity": 10, "note": "pre-batching count" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, repaired) = app.send("POST", "/maintenance/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(repaired.as_array().unwrap().is_empty());

    let (_, product) = app.send("GET", &format!("/products/{id}"), None).await;
    assert_eq!(product["stock"], 10);
}
