//! Integration tests for Batchwise.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests over the in-memory store
//! cargo test -p batchwise-integration-tests
//!
//! # PostgreSQL tests (migrated database required)
//! BATCHWISE_TEST_DATABASE_URL=postgres://localhost/batchwise_test \
//!     cargo test -p batchwise-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `http_inventory` - Routes driven with `tower::ServiceExt::oneshot`
//! - `postgres_store` - Engine over a real database (ignored by default)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use batchwise_server::config::InventoryConfig;
use batchwise_server::db::memory::MemoryInventoryStore;
use batchwise_server::routes;
use batchwise_server::services::{Clock, ManualClock};
use batchwise_server::state::AppState;

/// A router over a fresh in-memory store with a controllable clock.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryInventoryStore,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Start the clock at 2025-12-15 09:00 UTC.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(start_of_test())
    }

    /// Start the clock at `start`.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        let store = MemoryInventoryStore::new();
        let clock = Arc::new(ManualClock::new(start));
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            InventoryConfig::default(),
        );

        Self {
            router: routes::app(state),
            store,
            clock,
        }
    }

    /// Send a request and decode the JSON response (Null for empty bodies).
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body isn't JSON.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(method, uri, body, None).await
    }

    /// Like [`TestApp::send`], with an `X-Actor` header.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body isn't JSON.
    pub async fn send_as(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        actor: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            request = request.header("x-actor", actor);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// The instant test clocks start at.
///
/// # Panics
///
/// Never; the date is fixed and valid.
#[must_use]
pub fn start_of_test() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 15, 9, 0, 0)
        .single()
        .expect("valid start instant")
}

/// Date `days` after the test start, formatted for JSON bodies.
#[must_use]
pub fn date_in(days: i64) -> String {
    (start_of_test().date_naive() + TimeDelta::days(days)).to_string()
}
