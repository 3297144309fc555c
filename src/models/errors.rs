use thiserror::Error;

/// Service-level errors that can occur in business logic.
///
/// Display strings double as the response messages the HTTP layer returns,
/// so they are worded for the storefront client.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User does not have a cart")]
    CartNotFound,

    #[error("User not found: {email}")]
    UserNotFound { email: String },

    #[error("User does not have a cart. Use POST to create cart and add a product")]
    CartNotCreated,

    #[error("User does not have a cart")]
    NoCart,

    #[error("Product already in cart. Use the cart sidebar to update quantity or remove product")]
    ProductAlreadyInCart,

    #[error("Product doesn't exist in database")]
    ProductNotInCatalog,

    #[error("Product not in cart")]
    ProductNotInCart,

    #[error("No products in cart")]
    EmptyCart,

    #[error("Insufficient Balance")]
    InsufficientBalance,

    #[error("No address set")]
    AddressNotSet,

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid stored item: {message}")]
    InvalidItem { message: String },

    #[error("Concurrent update detected for cart: {email}")]
    VersionConflict { email: String },

    #[error("Transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
