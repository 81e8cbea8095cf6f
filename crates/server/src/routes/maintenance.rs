//! Maintenance handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Reconciliation;
use crate::state::AppState;

/// Build the maintenance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/maintenance/purge-adjustments", post(purge_adjustments))
        .route("/maintenance/reconcile", post(reconcile_all))
}

/// Query parameters for a purge.
#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    /// Overrides the configured retention.
    pub older_than_days: Option<i64>,
}

/// Response for a purge.
#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub purged: u64,
    pub older_than_days: i64,
}

async fn purge_adjustments(
    State(state): State<AppState>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResponse>, AppError> {
    let older_than_days = query
        .older_than_days
        .unwrap_or(state.inventory_config().adjustment_retention_days);
    let purged = state
        .engine()
        .purge_adjustments(Some(older_than_days))
        .await?;
    Ok(Json(PurgeResponse {
        purged,
        older_than_days,
    }))
}

/// Reconcile every product; returns only the repaired ones.
async fn reconcile_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reconciliation>>, AppError> {
    Ok(Json(state.engine().reconcile_all().await?))
}
