use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::DateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::{dynamodb_span, map_dynamodb_error};
use crate::models::{RepositoryError, RepositoryResult, User};

/// Trait defining the interface for account-record access.
///
/// Account management lives in another subsystem; checkout only needs to
/// read the record and persist the wallet debit.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Save a user (whole-document put)
    async fn save_user(&self, user: User) -> RepositoryResult<User>;
}

/// DynamoDB implementation of the UserRepository trait
pub struct DynamoDbUserRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbUserRepository {
    /// Create a new DynamoDB user repository
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

/// Convert a User struct to DynamoDB attribute values
pub(crate) fn user_to_item(user: &User) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    item.insert("email".to_string(), AttributeValue::S(user.email.clone()));
    item.insert("name".to_string(), AttributeValue::S(user.name.clone()));
    item.insert(
        "wallet_money".to_string(),
        AttributeValue::N(user.wallet_money.to_string()),
    );
    item.insert(
        "address".to_string(),
        AttributeValue::S(user.address.clone()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(user.created_at.to_rfc3339()),
    );
    item.insert(
        "updated_at".to_string(),
        AttributeValue::S(user.updated_at.to_rfc3339()),
    );

    item
}

/// Convert DynamoDB attribute values to a User struct
pub(crate) fn item_to_user(item: &HashMap<String, AttributeValue>) -> RepositoryResult<User> {
    let email = item
        .get("email")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing email in user".to_string(),
        })?
        .clone();

    let name = item
        .get("name")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing name in user".to_string(),
        })?
        .clone();

    let wallet_money = item
        .get("wallet_money")
        .and_then(|v| v.as_n().ok())
        .and_then(|s| Decimal::from_str(s).ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Invalid wallet_money in user".to_string(),
        })?;

    let address = item
        .get("address")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Missing address in user".to_string(),
        })?
        .clone();

    let created_at = item
        .get("created_at")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: "Invalid created_at in user".to_string(),
        })?;

    let updated_at = item
        .get("updated_at")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(created_at);

    Ok(User {
        email,
        name,
        wallet_money,
        address,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[instrument(skip(self), fields(table = %self.table_name, email = %email))]
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        info!("Finding user by email");

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
                let user = item_to_user(&item)?;
                info!("User found");
                Ok(Some(user))
            }
            None => {
                info!("User not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, user), fields(table = %self.table_name, email = %user.email))]
    async fn save_user(&self, user: User) -> RepositoryResult<User> {
        info!("Saving user");

        let item = user_to_item(&user);

        let put_span = dynamodb_span(&self.table_name, &self.region, "PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("User saved successfully");
        Ok(user)
    }
}
