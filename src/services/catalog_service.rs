use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{Product, ServiceError, ServiceResult};
use crate::repositories::ProductRepository;

/// Read-only product lookups backing the storefront's browse pages.
pub struct CatalogService {
    product_repository: Arc<dyn ProductRepository>,
}

impl CatalogService {
    /// Create a new CatalogService
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        Self { product_repository }
    }

    /// List all catalog products
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        info!("Listing products");

        let products = self.product_repository.find_all().await?;

        info!("Listed {} products", products.len());
        Ok(products)
    }

    /// Get a product by its ID
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &str) -> ServiceResult<Product> {
        info!("Getting product");

        if product_id.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Product ID cannot be empty".to_string(),
            });
        }

        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ServiceError::ProductNotInCatalog)
    }
}
