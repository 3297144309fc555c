pub mod cart;
pub mod catalog;
pub mod health;

pub use cart::create_cart_router;
pub use catalog::create_catalog_router;
pub use health::health_check;

use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use crate::models::{RepositoryError, ServiceError};

/// Convert ServiceError to an HTTP response.
///
/// The service's display strings are the storefront's client-facing
/// messages; no further translation happens here.
pub(crate) fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::CartNotFound | ServiceError::UserNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        ServiceError::CartNotCreated
        | ServiceError::NoCart
        | ServiceError::ProductAlreadyInCart
        | ServiceError::ProductNotInCatalog
        | ServiceError::ProductNotInCart
        | ServiceError::EmptyCart
        | ServiceError::InsufficientBalance
        | ServiceError::AddressNotSet
        | ServiceError::InvalidQuantity { .. }
        | ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            RepositoryError::VersionConflict { .. } | RepositoryError::TransactionFailed { .. } => {
                (StatusCode::CONFLICT, source.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
