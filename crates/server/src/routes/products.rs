//! Product and per-product stock handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use batchwise_core::ProductId;

use crate::error::AppError;
use crate::middleware::Actor;
use crate::models::{
    Adjustment, Batch, ConsumptionReceipt, CreateProductInput, Product, ProductCreated,
    Reconciliation, RestockInput,
};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(show_product))
        .route("/products/{id}/batches", get(list_batches).post(restock))
        .route("/products/{id}/consume", post(consume))
        .route("/products/{id}/correction", post(correct))
        .route("/products/{id}/reconcile", post(reconcile))
        .route("/products/{id}/adjustments", get(history))
}

/// Request body for a consumption.
#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub quantity: i32,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for a manual correction.
#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    /// New absolute stock.
    pub quantity: i32,
    #[serde(default)]
    pub note: Option<String>,
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.engine().list_products().await?))
}

async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ProductCreated>), AppError> {
    let created = state
        .engine()
        .create_product(input, actor.as_str())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.engine().get_product(id).await?))
}

async fn list_batches(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Batch>>, AppError> {
    Ok(Json(state.engine().list_batches(id).await?))
}

async fn restock(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    actor: Actor,
    Json(input): Json<RestockInput>,
) -> Result<(StatusCode, Json<Batch>), AppError> {
    let batch = state.engine().restock(id, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

async fn consume(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    actor: Actor,
    Json(body): Json<ConsumeRequest>,
) -> Result<Json<ConsumptionReceipt>, AppError> {
    let receipt = state
        .engine()
        .consume(id, body.quantity, body.note.as_deref(), actor.as_str())
        .await?;
    Ok(Json(receipt))
}

async fn correct(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    actor: Actor,
    Json(body): Json<CorrectionRequest>,
) -> Result<Json<Adjustment>, AppError> {
    let adjustment = state
        .engine()
        .correct(id, body.quantity, body.note.as_deref(), actor.as_str())
        .await?;
    Ok(Json(adjustment))
}

async fn reconcile(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Reconciliation>, AppError> {
    Ok(Json(state.engine().reconcile(id).await?))
}

async fn history(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Adjustment>>, AppError> {
    Ok(Json(state.engine().history(id).await?))
}
