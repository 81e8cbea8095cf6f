//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness check
//! GET    /health/ready                   - Readiness check (store reachable)
//!
//! # Products
//! GET    /products                       - List products
//! POST   /products                       - Create product (optional starting stock)
//! GET    /products/{id}                  - Product detail
//! GET    /products/{id}/batches          - Live batches, consumption order
//! POST   /products/{id}/batches          - Restock (receive a batch)
//! POST   /products/{id}/consume          - FIFO consumption
//! POST   /products/{id}/correction       - Set absolute stock
//! POST   /products/{id}/reconcile        - Recompute stock from batches
//! GET    /products/{id}/adjustments      - Ledger, newest first
//!
//! # Batches
//! DELETE /batches/{id}                   - Remove a batch
//!
//! # Reporting
//! GET    /adjustments/recent?days=N      - Ledger across products (default 7 days)
//! GET    /expiring?days=N                - Expiry radar (default 30 days)
//! GET    /alerts/expiry                  - New expiry alerts
//!
//! # Maintenance
//! POST   /maintenance/purge-adjustments  - Purge old ledger entries
//! POST   /maintenance/reconcile          - Reconcile every product
//! ```
//!
//! Mutating routes read the caller from the `X-Actor` header.

pub mod adjustments;
pub mod batches;
pub mod expiry;
pub mod health;
pub mod maintenance;
pub mod products;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the complete route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(batches::router())
        .merge(adjustments::router())
        .merge(expiry::router())
        .merge(maintenance::router())
}

/// Build the application with request tracing and state attached.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
