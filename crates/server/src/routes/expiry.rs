//! Expiry radar and alert handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use batchwise_core::ExpiryBand;

use crate::error::AppError;
use crate::models::ExpiringBatch;
use crate::services::ExpiryAlert;
use crate::state::AppState;

/// Build the expiry router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/expiring", get(expiring))
        .route("/alerts/expiry", get(expiry_alerts))
}

/// Query parameters for the radar.
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Days ahead to look (default 30).
    pub days: Option<i64>,
}

async fn expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<ExpiringBatch>>, AppError> {
    let days = query.days.unwrap_or(ExpiryBand::CAUTION_DAYS);
    Ok(Json(state.engine().expiring(days).await?))
}

/// Alerts not raised within the suppression window.
async fn expiry_alerts(State(state): State<AppState>) -> Result<Json<Vec<ExpiryAlert>>, AppError> {
    Ok(Json(state.alerter().scan().await?))
}
