// Repositories module - data access layer

pub mod cart_repository;
pub mod checkout_repository;
pub mod product_repository;
pub mod user_repository;

pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use checkout_repository::{CheckoutRepository, DynamoDbCheckoutRepository};
pub use product_repository::{DynamoDbProductRepository, ProductRepository};
pub use user_repository::{DynamoDbUserRepository, UserRepository};

use aws_sdk_dynamodb::Error as DynamoDbError;

use crate::models::RepositoryError;

/// Client span for a DynamoDB call, following OpenTelemetry database
/// semantic conventions.
pub(crate) fn dynamodb_span(table_name: &str, region: &str, operation: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,
        "aws.region" = %region,
        "component" = "aws-sdk-dynamodb",
    )
}

/// Convert a DynamoDB error to a RepositoryError
pub(crate) fn map_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    tracing::error!("DynamoDB error: {:?}", error);
    match error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        DynamoDbError::TransactionCanceledException(e) => RepositoryError::TransactionFailed {
            message: e.to_string(),
        },
        other => RepositoryError::AwsSdk {
            message: other.to_string(),
        },
    }
}
