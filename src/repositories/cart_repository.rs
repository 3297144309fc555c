use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::DateTime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::product_repository::{item_to_product, product_to_item};
use super::{dynamodb_span, map_dynamodb_error};
use crate::models::{Cart, CartItem, RepositoryError, RepositoryResult};

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a cart by the owner's email
    async fn find_cart(&self, email: &str) -> RepositoryResult<Option<Cart>>;

    /// Save a cart (create or update) as a whole-document conditional put.
    ///
    /// The put is conditioned on the version the caller read: version 0
    /// requires that no document exists yet, any other version must match
    /// the stored one. The returned cart carries the incremented version.
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart>;

    /// Check if a cart exists for a user
    async fn cart_exists(&self, email: &str) -> RepositoryResult<bool>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    /// Create a new DynamoDB cart repository
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

/// Convert a Cart struct to DynamoDB attribute values.
///
/// Writes the version the document should carry after the save; the
/// condition expression still references the version that was read.
pub(crate) fn cart_to_item(cart: &Cart, version: u64) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    item.insert("email".to_string(), AttributeValue::S(cart.email.clone()));

    let items: Vec<AttributeValue> = cart
        .items
        .iter()
        .map(|cart_item| {
            let mut item_map = HashMap::new();
            item_map.insert(
                "product".to_string(),
                AttributeValue::M(product_to_item(&cart_item.product)),
            );
            item_map.insert(
                "quantity".to_string(),
                AttributeValue::N(cart_item.quantity.to_string()),
            );
            AttributeValue::M(item_map)
        })
        .collect();

    item.insert("items".to_string(), AttributeValue::L(items));
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(cart.created_at.to_rfc3339()),
    );
    item.insert(
        "updated_at".to_string(),
        AttributeValue::S(cart.updated_at.to_rfc3339()),
    );
    item.insert("version".to_string(), AttributeValue::N(version.to_string()));

    item
}

/// Convert DynamoDB attribute values to a Cart struct
pub(crate) fn item_to_cart(item: HashMap<String, AttributeValue>) -> RepositoryResult<Cart> {
    let email = item
        .get("email")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing email".to_string(),
        })?
        .clone();

    let items = item
        .get("items")
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|item_attr| {
                    item_attr
                        .as_m()
                        .ok()
                        .and_then(|item_map| map_to_cart_item(item_map).ok())
                })
                .collect()
        })
        .unwrap_or_default();

    let created_at = item
        .get("created_at")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Invalid created_at".to_string(),
        })?;

    let updated_at = item
        .get("updated_at")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(created_at);

    let version = item
        .get("version")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    Ok(Cart {
        email,
        items,
        created_at,
        updated_at,
        version,
    })
}

/// Convert a DynamoDB map to a CartItem
pub(crate) fn map_to_cart_item(
    item_map: &HashMap<String, AttributeValue>,
) -> RepositoryResult<CartItem> {
    let product = item_map
        .get("product")
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing product snapshot in cart item".to_string(),
        })
        .and_then(item_to_product)?;

    let quantity = item_map
        .get("quantity")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Invalid quantity in cart item".to_string(),
        })?;

    Ok(CartItem { product, quantity })
}

#[async_trait]
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, email = %email))]
    async fn find_cart(&self, email: &str) -> RepositoryResult<Option<Cart>> {
        info!("Finding cart for user");

        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("email", AttributeValue::S(email.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => {
                let cart = item_to_cart(item)?;
                info!("Cart found with {} items", cart.items.len());
                Ok(Some(cart))
            }
            None => {
                info!("Cart not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, cart), fields(table = %self.table_name, email = %cart.email, item_count = cart.items.len(), version = cart.version))]
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        info!("Saving cart");

        let next_version = cart.version + 1;
        let item = cart_to_item(&cart, next_version);

        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item));

        if cart.version == 0 {
            request = request.condition_expression("attribute_not_exists(email)");
        } else {
            request = request
                .condition_expression("version = :expected")
                .expression_attribute_values(
                    ":expected",
                    AttributeValue::N(cart.version.to_string()),
                );
        }

        let put_span = dynamodb_span(&self.table_name, &self.region, "PutItem");

        async {
            request.send().await.map_err(|e| {
                let error: DynamoDbError = e.into();
                match error {
                    DynamoDbError::ConditionalCheckFailedException(_) => {
                        RepositoryError::VersionConflict {
                            email: cart.email.clone(),
                        }
                    }
                    other => map_dynamodb_error(&self.table_name, other),
                }
            })
        }
        .instrument(put_span)
        .await?;

        info!("Cart saved successfully");
        Ok(Cart {
            version: next_version,
            ..cart
        })
    }

    #[instrument(skip(self), fields(table = %self.table_name, email = %email))]
    async fn cart_exists(&self, email: &str) -> RepositoryResult<bool> {
        info!("Checking if cart exists");

        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("email", AttributeValue::S(email.to_string()))
                .projection_expression("email")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        let exists = response.item.is_some();
        info!("Cart exists: {}", exists);
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use rust_decimal_macros::dec;

    fn create_test_cart() -> Cart {
        let mut cart = Cart::new("shopper@example.com".to_string());
        cart.add_item(
            Product::new(
                "P001".to_string(),
                "UNIFACTOR Mens Running Shoes".to_string(),
                "Footwear".to_string(),
                dec!(50),
            ),
            2,
        );
        cart.add_item(
            Product::new(
                "P002".to_string(),
                "Tan Leatherette Weekender Duffle".to_string(),
                "Fashion".to_string(),
                dec!(31),
            ),
            1,
        );
        cart
    }

    #[test]
    fn test_cart_to_item_conversion() {
        let cart = create_test_cart();

        let item = cart_to_item(&cart, cart.version + 1);

        assert!(item.contains_key("email"));
        assert!(item.contains_key("items"));
        assert!(item.contains_key("created_at"));
        assert!(item.contains_key("updated_at"));
        assert!(item.contains_key("version"));

        if let Some(AttributeValue::S(email)) = item.get("email") {
            assert_eq!(email, "shopper@example.com");
        } else {
            panic!("Expected string value for email");
        }

        if let Some(AttributeValue::L(items)) = item.get("items") {
            assert_eq!(items.len(), 2);

            if let AttributeValue::M(first_item) = &items[0] {
                assert!(first_item.contains_key("product"));
                assert!(first_item.contains_key("quantity"));
            } else {
                panic!("Expected map value for cart item");
            }
        } else {
            panic!("Expected list value for items");
        }

        if let Some(AttributeValue::N(version)) = item.get("version") {
            assert_eq!(version, "1");
        } else {
            panic!("Expected number value for version");
        }
    }

    #[test]
    fn test_item_to_cart_conversion() {
        let cart = create_test_cart();

        let item = cart_to_item(&cart, cart.version + 1);
        let converted = item_to_cart(item).unwrap();

        assert_eq!(converted.email, cart.email);
        assert_eq!(converted.items.len(), cart.items.len());
        assert_eq!(converted.version, cart.version + 1);

        let original_item = &cart.items[0];
        let converted_item = &converted.items[0];

        assert_eq!(converted_item.product, original_item.product);
        assert_eq!(converted_item.quantity, original_item.quantity);
        assert_eq!(converted_item.product.cost, dec!(50));
    }

    #[test]
    fn test_empty_cart_conversion() {
        let cart = Cart::new("new-shopper@example.com".to_string());

        let item = cart_to_item(&cart, 1);
        let converted = item_to_cart(item).unwrap();

        assert_eq!(converted.email, cart.email);
        assert!(converted.items.is_empty());
        assert_eq!(converted.total_items(), 0);
    }

    #[test]
    fn test_item_to_cart_conversion_missing_updated_at() {
        let cart = create_test_cart();

        let mut item = cart_to_item(&cart, 1);
        // Legacy documents may predate the updated_at attribute
        item.remove("updated_at");

        let converted = item_to_cart(item).unwrap();

        assert_eq!(converted.email, cart.email);
        assert_eq!(converted.updated_at, converted.created_at);
    }

    #[test]
    fn test_item_to_cart_conversion_missing_version() {
        let cart = create_test_cart();

        let mut item = cart_to_item(&cart, 1);
        // Documents written before versioning default to 1
        item.remove("version");

        let converted = item_to_cart(item).unwrap();
        assert_eq!(converted.version, 1);
    }

    #[test]
    fn test_invalid_cart_item_handling() {
        let mut invalid_item_map = HashMap::new();
        invalid_item_map.insert("quantity".to_string(), AttributeValue::N("3".to_string()));
        // Missing product snapshot

        let result = map_to_cart_item(&invalid_item_map);
        assert!(result.is_err());

        match result.unwrap_err() {
            RepositoryError::InvalidItem { message } => {
                assert!(message.contains("Missing product snapshot"));
            }
            _ => panic!("Expected InvalidItem error"),
        }
    }

    #[test]
    fn test_repository_creation() {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        let repo =
            DynamoDbCartRepository::new(client, "test-carts".to_string(), "us-east-1".to_string());

        assert_eq!(repo.table_name(), "test-carts");
    }
}
