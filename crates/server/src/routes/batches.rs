//! Batch handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::delete,
};
use serde::Deserialize;

use batchwise_core::BatchId;

use crate::error::AppError;
use crate::middleware::Actor;
use crate::models::Adjustment;
use crate::state::AppState;

/// Build the batches router.
pub fn router() -> Router<AppState> {
    Router::new().route("/batches/{id}", delete(delete_batch))
}

/// Query parameters for removing a batch.
#[derive(Debug, Deserialize)]
pub struct DeleteBatchQuery {
    /// Reason recorded in the ledger (e.g. "spoiled").
    pub note: Option<String>,
}

/// Remove a live batch and record the deletion.
async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<BatchId>,
    Query(query): Query<DeleteBatchQuery>,
    actor: Actor,
) -> Result<Json<Adjustment>, AppError> {
    let adjustment = state
        .engine()
        .delete_batch(id, query.note.as_deref(), actor.as_str())
        .await?;
    Ok(Json(adjustment))
}
