use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::{dynamodb_span, map_dynamodb_error};
use crate::models::{Product, RepositoryError, RepositoryResult};

/// Trait defining the interface for catalog lookups.
///
/// The catalog is read-only from the storefront's point of view; product
/// management belongs to a different subsystem.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a product by its ID
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>>;

    /// List all catalog products
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;
}

/// DynamoDB implementation of the ProductRepository trait
pub struct DynamoDbProductRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbProductRepository {
    /// Create a new DynamoDB product repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Convert a Product struct to DynamoDB attribute values.
///
/// Shared with the cart repository, which stores the product snapshot of
/// every line item in the same shape.
pub(crate) fn product_to_item(product: &Product) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    item.insert("id".to_string(), AttributeValue::S(product.id.clone()));
    item.insert("name".to_string(), AttributeValue::S(product.name.clone()));
    item.insert(
        "category".to_string(),
        AttributeValue::S(product.category.clone()),
    );
    item.insert(
        "cost".to_string(),
        AttributeValue::N(product.cost.to_string()),
    );
    if let Some(rating) = product.rating {
        item.insert("rating".to_string(), AttributeValue::N(rating.to_string()));
    }
    if let Some(ref image) = product.image {
        item.insert("image".to_string(), AttributeValue::S(image.clone()));
    }

    item
}

/// Convert DynamoDB attribute values to a Product struct
pub(crate) fn item_to_product(item: &HashMap<String, AttributeValue>) -> RepositoryResult<Product> {
    let id = item
        .get("id")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing id in product".to_string(),
        })?
        .clone();

    let name = item
        .get("name")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing name in product".to_string(),
        })?
        .clone();

    let category = item
        .get("category")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing category in product".to_string(),
        })?
        .clone();

    let cost = item
        .get("cost")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| Decimal::from_str(s).ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Invalid cost in product".to_string(),
        })?;

    let rating = item
        .get("rating")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok());

    let image = item
        .get("image")
        .and_then(|v| v.as_s().ok())
        .cloned();

    Ok(Product {
        id,
        name,
        category,
        cost,
        rating,
        image,
    })
}

#[async_trait]
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table_name, product_id = %product_id))]
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        info!("Finding product by id");

        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(product_id.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let product = item_to_product(&item)?;
                info!("Product found: {}", product.name);
                Ok(Some(product))
            }
            None => {
                info!("Product not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        info!("Listing all products");

        let scan_span = dynamodb_span(&self.table_name, &self.region, "Scan");

        let response = async {
            self.client
                .scan()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(scan_span)
        .await?;

        let mut products = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match item_to_product(&item) {
                    Ok(product) => products.push(product),
                    Err(e) => {
                        warn!("Failed to parse product item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} products", products.len());
        Ok(products)
    }
}
