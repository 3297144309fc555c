use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::cart_repository::cart_to_item;
use super::user_repository::user_to_item;
use super::{dynamodb_span, map_dynamodb_error};
use crate::models::{Cart, RepositoryError, RepositoryResult, User};

/// Commits a checkout: the emptied cart and the debited user are written in
/// one atomic transaction, so no observable state has one without the other.
#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Write both documents transactionally.
    ///
    /// The cart put is conditioned on the version the caller read and the
    /// user put on the wallet balance the debit was computed from
    /// (`expected_wallet`); a concurrent writer on either record cancels
    /// the whole transaction.
    async fn commit_checkout(
        &self,
        cart: &Cart,
        user: &User,
        expected_wallet: Decimal,
    ) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the CheckoutRepository trait
pub struct DynamoDbCheckoutRepository {
    client: Arc<DynamoDbClient>,
    carts_table_name: String,
    users_table_name: String,
    region: String,
}

impl DynamoDbCheckoutRepository {
    /// Create a new DynamoDB checkout repository
    pub fn new(
        client: Arc<DynamoDbClient>,
        carts_table_name: String,
        users_table_name: String,
        region: String,
    ) -> Self {
        Self {
            client,
            carts_table_name,
            users_table_name,
            region,
        }
    }

    fn build_error(message: String) -> RepositoryError {
        RepositoryError::AwsSdk { message }
    }
}

#[async_trait]
impl CheckoutRepository for DynamoDbCheckoutRepository {
    #[instrument(
        skip(self, cart, user),
        fields(
            carts_table = %self.carts_table_name,
            users_table = %self.users_table_name,
            email = %cart.email,
            cart_version = cart.version,
        )
    )]
    async fn commit_checkout(
        &self,
        cart: &Cart,
        user: &User,
        expected_wallet: Decimal,
    ) -> RepositoryResult<()> {
        info!("Committing checkout transaction");

        let cart_put = Put::builder()
            .table_name(&self.carts_table_name)
            .set_item(Some(cart_to_item(cart, cart.version + 1)))
            .condition_expression("version = :expected")
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(cart.version.to_string()),
            )
            .build()
            .map_err(|e| Self::build_error(e.to_string()))?;

        let user_put = Put::builder()
            .table_name(&self.users_table_name)
            .set_item(Some(user_to_item(user)))
            .condition_expression("wallet_money = :expected")
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_wallet.to_string()),
            )
            .build()
            .map_err(|e| Self::build_error(e.to_string()))?;

        let transact_span = dynamodb_span(&self.carts_table_name, &self.region, "TransactWriteItems");

        async {
            self.client
                .transact_write_items()
                .transact_items(TransactWriteItem::builder().put(cart_put).build())
                .transact_items(TransactWriteItem::builder().put(user_put).build())
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.carts_table_name, e.into()))
        }
        .instrument(transact_span)
        .await?;

        info!("Checkout transaction committed");
        Ok(())
    }
}
