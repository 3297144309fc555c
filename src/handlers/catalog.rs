use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::service_error_to_response;
use crate::models::Product;
use crate::services::CatalogService;

/// State for catalog handlers
#[derive(Clone)]
pub struct CatalogHandlerState {
    pub catalog_service: Arc<CatalogService>,
}

/// Create the read-only catalog router
pub fn create_catalog_router(catalog_service: Arc<CatalogService>) -> Router {
    let state = CatalogHandlerState { catalog_service };

    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/:product_id", get(get_product))
        .with_state(state)
}

/// List all catalog products
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<CatalogHandlerState>,
) -> Result<Json<Vec<Product>>, (StatusCode, Json<Value>)> {
    info!("Listing products");

    match state.catalog_service.list_products().await {
        Ok(products) => {
            info!("Successfully listed {} products", products.len());
            Ok(Json(products))
        }
        Err(err) => {
            error!("Failed to list products: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific product by ID
#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn get_product(
    State(state): State<CatalogHandlerState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    info!("Getting product with ID: {}", product_id);

    match state.catalog_service.get_product(&product_id).await {
        Ok(product) => {
            info!("Successfully retrieved product: {}", product.name);
            Ok(Json(product))
        }
        Err(err) => {
            error!("Failed to get product {}: {}", product_id, err);
            Err(service_error_to_response(err))
        }
    }
}
