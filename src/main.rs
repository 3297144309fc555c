use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use storefront_rs::{
    handlers::{create_cart_router, create_catalog_router, health_check},
    init_logging,
    repositories::{
        DynamoDbCartRepository, DynamoDbCheckoutRepository, DynamoDbProductRepository,
        DynamoDbUserRepository,
    },
    services::{CartService, CatalogService},
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;

    init_logging(
        &config.observability.service_name,
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!("Starting storefront-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: carts={}, products={}, users={}",
        config.database.carts_table_name,
        config.database.products_table_name,
        config.database.users_table_name
    );

    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());

    let product_repository = Arc::new(DynamoDbProductRepository::new(
        dynamodb_client.clone(),
        config.database.products_table_name.clone(),
        config.database.region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        dynamodb_client.clone(),
        config.database.carts_table_name.clone(),
        config.database.region.clone(),
    ));
    let user_repository = Arc::new(DynamoDbUserRepository::new(
        dynamodb_client.clone(),
        config.database.users_table_name.clone(),
        config.database.region.clone(),
    ));
    let checkout_repository = Arc::new(DynamoDbCheckoutRepository::new(
        dynamodb_client.clone(),
        config.database.carts_table_name.clone(),
        config.database.users_table_name.clone(),
        config.database.region.clone(),
    ));
    info!("Repositories initialized successfully");

    let cart_service = Arc::new(CartService::new(
        cart_repository,
        product_repository.clone(),
        user_repository,
        checkout_repository,
        config.store.default_address.clone(),
    ));
    let catalog_service = Arc::new(CatalogService::new(product_repository));
    info!("Services initialized successfully");

    let app = create_app(
        cart_service,
        catalog_service,
        config.server.request_timeout(),
        config.server.max_request_size,
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    cart_service: Arc<CartService>,
    catalog_service: Arc<CatalogService>,
    request_timeout: std::time::Duration,
    max_request_size: usize,
) -> Router {
    Router::new()
        .route("/health/status", get(health_check))
        .merge(create_cart_router(cart_service))
        .merge(create_catalog_router(catalog_service))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(DefaultBodyLimit::max(max_request_size)),
        )
}
