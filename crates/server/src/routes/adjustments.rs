//! Adjustment ledger handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Adjustment;
use crate::state::AppState;

const DEFAULT_RECENT_DAYS: i64 = 7;

/// Build the adjustments router.
pub fn router() -> Router<AppState> {
    Router::new().route("/adjustments/recent", get(recent))
}

/// Query parameters for recent adjustments.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub days: Option<i64>,
}

async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Adjustment>>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_RECENT_DAYS);
    Ok(Json(state.engine().recent(days).await?))
}
