//! Unified error handling for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::EngineError;

/// Application-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inventory operation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Engine(err) => match err {
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::ProductNotFound(_) | EngineError::BatchNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                EngineError::Unavailable(_) | EngineError::InsufficientStock { .. } => {
                    StatusCode::CONFLICT
                }
                EngineError::Consistency { .. } | EngineError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Stable machine-readable error code.
    const fn code(&self) -> &'static str {
        match self {
            Self::Engine(err) => match err {
                EngineError::Validation(_) => "validation_error",
                EngineError::ProductNotFound(_) | EngineError::BatchNotFound(_) => "not_found",
                EngineError::Unavailable(_) => "unavailable",
                EngineError::InsufficientStock { .. } => "insufficient_stock",
                EngineError::Consistency { .. } => "consistency_error",
                EngineError::Repository(_) => "internal_error",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Inventory request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": self.code(),
            "message": message,
        });
        if let Self::Engine(EngineError::InsufficientStock {
            requested,
            available,
            ..
        }) = &self
        {
            body["requested"] = json!(requested);
            body["available"] = json!(available);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;
    use axum::body::to_bytes;
    use batchwise_core::{BatchId, ProductId};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(EngineError::ProductNotFound(ProductId::new(4)));
        assert_eq!(err.to_string(), "product 4 not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(EngineError::Validation("bad".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(EngineError::ProductNotFound(ProductId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(EngineError::BatchNotFound(BatchId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(EngineError::Unavailable(ProductId::new(1)).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                EngineError::InsufficientStock {
                    product_id: ProductId::new(1),
                    requested: 5,
                    available: 2,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                EngineError::Consistency {
                    product_id: ProductId::new(1),
                    stock: 1,
                    batch_total: 9,
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(EngineError::Repository(RepositoryError::NotFound).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_body_carries_quantities() {
        let body = body_json(
            EngineError::InsufficientStock {
                product_id: ProductId::new(3),
                requested: 12,
                available: 9,
            }
            .into(),
        )
        .await;

        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["requested"], 12);
        assert_eq!(body["available"], 9);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let body = body_json(
            EngineError::Repository(RepositoryError::DataCorruption("secret detail".to_string()))
                .into(),
        )
        .await;

        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "Internal server error");
    }
}
