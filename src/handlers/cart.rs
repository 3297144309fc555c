use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::service_error_to_response;
use crate::models::{AddProductRequest, CartResponse, RemoveProductRequest, UpdateProductRequest};
use crate::services::CartService;

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub cart_service: Arc<CartService>,
}

/// Create the cart router.
///
/// One `/cart` resource per user: GET reads, POST adds a product, PUT
/// replaces a line's quantity, DELETE removes a line, and a nested POST
/// performs checkout. The email path segment stands in for the
/// authenticated user, which an upstream gateway supplies.
pub fn create_cart_router(cart_service: Arc<CartService>) -> Router {
    let state = CartHandlerState { cart_service };

    Router::new()
        .route(
            "/api/cart/:email",
            get(get_cart)
                .post(add_product)
                .put(update_product)
                .delete(remove_product),
        )
        .route("/api/cart/:email/checkout", post(checkout))
        .with_state(state)
}

/// Get a user's cart
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<CartHandlerState>,
    Path(email): Path<String>,
) -> Result<Json<CartResponse>, (StatusCode, Json<Value>)> {
    info!("Getting cart for user: {}", email);

    match state.cart_service.get_cart_by_user(&email).await {
        Ok(cart) => {
            info!("Successfully retrieved cart with {} items", cart.total_items);
            Ok(Json(cart))
        }
        Err(err) => {
            error!("Failed to get cart for user {}: {}", email, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Add a product to the cart
#[instrument(skip(state, request))]
pub async fn add_product(
    State(state): State<CartHandlerState>,
    Path(email): Path<String>,
    Json(request): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<CartResponse>), (StatusCode, Json<Value>)> {
    info!(
        "Adding product to cart for user: {}, product_id: {}, quantity: {}",
        email, request.product_id, request.quantity
    );

    match state.cart_service.add_product_to_cart(&email, request).await {
        Ok(cart) => {
            info!("Successfully added product to cart");
            Ok((StatusCode::CREATED, Json(cart)))
        }
        Err(err) => {
            error!("Failed to add product to cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Replace the quantity of a product already in the cart
#[instrument(skip(state, request))]
pub async fn update_product(
    State(state): State<CartHandlerState>,
    Path(email): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<CartResponse>, (StatusCode, Json<Value>)> {
    info!(
        "Updating cart line for user: {}, product_id: {}, new_quantity: {}",
        email, request.product_id, request.quantity
    );

    match state
        .cart_service
        .update_product_in_cart(&email, request)
        .await
    {
        Ok(cart) => {
            info!("Successfully updated cart line");
            Ok(Json(cart))
        }
        Err(err) => {
            error!("Failed to update cart line: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Remove a product from the cart
#[instrument(skip(state, request))]
pub async fn remove_product(
    State(state): State<CartHandlerState>,
    Path(email): Path<String>,
    Json(request): Json<RemoveProductRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    info!(
        "Removing product from cart for user: {}, product_id: {}",
        email, request.product_id
    );

    match state
        .cart_service
        .delete_product_from_cart(&email, &request.product_id)
        .await
    {
        Ok(()) => {
            info!("Successfully removed product from cart");
            Ok(StatusCode::OK)
        }
        Err(err) => {
            error!("Failed to remove product from cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Check out the cart
#[instrument(skip(state))]
pub async fn checkout(
    State(state): State<CartHandlerState>,
    Path(email): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    info!("Processing checkout for user: {}", email);

    match state.cart_service.checkout(&email).await {
        Ok(()) => {
            info!("Checkout completed successfully");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("Failed to process checkout: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
