use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    AddProductRequest, Cart, CartResponse, ServiceError, ServiceResult, UpdateProductRequest,
};
use crate::repositories::{
    CartRepository, CheckoutRepository, ProductRepository, UserRepository,
};

const MAX_LINE_QUANTITY: u32 = 100;

/// Service for managing a user's shopping cart and checkout.
///
/// One cart per user, keyed by email. Every operation is a read-modify-write
/// cycle against the cart document; the repository's version condition turns
/// a concurrent write into an error instead of a lost update.
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
    user_repository: Arc<dyn UserRepository>,
    checkout_repository: Arc<dyn CheckoutRepository>,
    default_address: String,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
        user_repository: Arc<dyn UserRepository>,
        checkout_repository: Arc<dyn CheckoutRepository>,
        default_address: String,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
            user_repository,
            checkout_repository,
            default_address,
        }
    }

    /// Get a user's cart
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_cart_by_user(&self, email: &str) -> ServiceResult<CartResponse> {
        info!("Getting cart for user");

        self.validate_email(email)?;

        let cart = self
            .cart_repository
            .find_cart(email)
            .await?
            .ok_or(ServiceError::CartNotFound)?;

        info!("Cart retrieved with {} items", cart.items.len());
        Ok(cart.to_response())
    }

    /// Add a product to the cart, creating the cart lazily on first add.
    ///
    /// Never touches the quantity of an existing line; that is what update
    /// is for.
    #[instrument(skip(self, request), fields(email = %email, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_product_to_cart(
        &self,
        email: &str,
        request: AddProductRequest,
    ) -> ServiceResult<CartResponse> {
        info!("Adding product to cart");

        self.validate_email(email)?;
        self.validate_product_id(&request.product_id)?;
        self.validate_quantity(request.quantity)?;

        let mut cart = match self.cart_repository.find_cart(email).await? {
            Some(cart) => cart,
            None => {
                info!("Cart not found, creating empty cart");
                Cart::new(email.to_string())
            }
        };

        if cart.contains_item(&request.product_id) {
            return Err(ServiceError::ProductAlreadyInCart);
        }

        let product = self
            .product_repository
            .find_by_id(&request.product_id)
            .await?
            .ok_or(ServiceError::ProductNotInCatalog)?;

        cart.add_item(product, request.quantity);

        let saved = self.cart_repository.save_cart(cart).await?;

        info!("Product added to cart successfully");
        Ok(saved.to_response())
    }

    /// Replace the quantity of a line already in the cart
    #[instrument(skip(self, request), fields(email = %email, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn update_product_in_cart(
        &self,
        email: &str,
        request: UpdateProductRequest,
    ) -> ServiceResult<CartResponse> {
        info!("Updating product quantity in cart");

        self.validate_email(email)?;
        self.validate_product_id(&request.product_id)?;
        self.validate_quantity(request.quantity)?;

        let mut cart = self
            .cart_repository
            .find_cart(email)
            .await?
            .ok_or(ServiceError::CartNotCreated)?;

        self.product_repository
            .find_by_id(&request.product_id)
            .await?
            .ok_or(ServiceError::ProductNotInCatalog)?;

        if !cart.update_item_quantity(&request.product_id, request.quantity) {
            return Err(ServiceError::ProductNotInCart);
        }

        let saved = self.cart_repository.save_cart(cart).await?;

        info!("Cart line updated successfully");
        Ok(saved.to_response())
    }

    /// Remove a line from the cart
    #[instrument(skip(self), fields(email = %email, product_id = %product_id))]
    pub async fn delete_product_from_cart(
        &self,
        email: &str,
        product_id: &str,
    ) -> ServiceResult<()> {
        info!("Removing product from cart");

        self.validate_email(email)?;
        self.validate_product_id(product_id)?;

        let mut cart = self
            .cart_repository
            .find_cart(email)
            .await?
            .ok_or(ServiceError::NoCart)?;

        if !cart.remove_item(product_id) {
            return Err(ServiceError::ProductNotInCart);
        }

        self.cart_repository.save_cart(cart).await?;

        info!("Product removed from cart successfully");
        Ok(())
    }

    /// Check out the cart: debit the wallet by the cart total and empty the
    /// item list, committed as one transaction.
    ///
    /// Precondition chain in order, first failure wins; nothing is written
    /// until every check has passed:
    /// cart exists -> cart non-empty -> balance covers total -> address set.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn checkout(&self, email: &str) -> ServiceResult<()> {
        info!("Processing checkout");

        self.validate_email(email)?;

        let mut cart = self
            .cart_repository
            .find_cart(email)
            .await?
            .ok_or(ServiceError::CartNotFound)?;

        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let total = cart.total_price();

        let mut user = self
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                email: email.to_string(),
            })?;

        if user.wallet_money < total {
            return Err(ServiceError::InsufficientBalance);
        }

        if !user.has_set_non_default_address(&self.default_address) {
            return Err(ServiceError::AddressNotSet);
        }

        let expected_wallet = user.wallet_money;
        user.debit_wallet(total);
        cart.clear();

        self.checkout_repository
            .commit_checkout(&cart, &user, expected_wallet)
            .await?;

        info!(%total, "Checkout completed successfully");
        Ok(())
    }

    /// Validate user email
    fn validate_email(&self, email: &str) -> ServiceResult<()> {
        if email.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Email cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Validate product ID
    fn validate_product_id(&self, product_id: &str) -> ServiceResult<()> {
        if product_id.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Product ID cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Validate line quantity
    fn validate_quantity(&self, quantity: u32) -> ServiceResult<()> {
        if quantity == 0 {
            return Err(ServiceError::InvalidQuantity { quantity });
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::ValidationError {
                message: format!("Quantity cannot exceed {}", MAX_LINE_QUANTITY),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, RepositoryError, User};
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const DEFAULT_ADDRESS: &str = "ADDRESS_NOT_SET";

    // Mock repositories for testing
    mock! {
        TestCartRepository {}

        #[async_trait]
        impl CartRepository for TestCartRepository {
            async fn find_cart(&self, email: &str) -> Result<Option<Cart>, RepositoryError>;
            async fn save_cart(&self, cart: Cart) -> Result<Cart, RepositoryError>;
            async fn cart_exists(&self, email: &str) -> Result<bool, RepositoryError>;
        }
    }

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, RepositoryError>;
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
        }
    }

    mock! {
        TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
            async fn save_user(&self, user: User) -> Result<User, RepositoryError>;
        }
    }

    mock! {
        TestCheckoutRepository {}

        #[async_trait]
        impl CheckoutRepository for TestCheckoutRepository {
            async fn commit_checkout(
                &self,
                cart: &Cart,
                user: &User,
                expected_wallet: Decimal,
            ) -> Result<(), RepositoryError>;
        }
    }

    fn create_test_product() -> Product {
        Product::new(
            "P001".to_string(),
            "UNIFACTOR Mens Running Shoes".to_string(),
            "Footwear".to_string(),
            dec!(100),
        )
    }

    fn create_test_cart() -> Cart {
        let mut cart = Cart::new("shopper@example.com".to_string());
        cart.add_item(create_test_product(), 2);
        cart.version = 1;
        cart
    }

    fn create_test_user(wallet: Decimal, address: &str) -> User {
        User::new(
            "shopper@example.com".to_string(),
            "Test Shopper".to_string(),
            wallet,
            address.to_string(),
        )
    }

    fn create_service(
        cart_repo: MockTestCartRepository,
        product_repo: MockTestProductRepository,
        user_repo: MockTestUserRepository,
        checkout_repo: MockTestCheckoutRepository,
    ) -> CartService {
        CartService::new(
            Arc::new(cart_repo),
            Arc::new(product_repo),
            Arc::new(user_repo),
            Arc::new(checkout_repo),
            DEFAULT_ADDRESS.to_string(),
        )
    }

    #[tokio::test]
    async fn test_get_cart_existing() {
        let mut cart_repo = MockTestCartRepository::new();
        let test_cart = create_test_cart();

        cart_repo
            .expect_find_cart()
            .with(mockall::predicate::eq("shopper@example.com".to_string()))
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service.get_cart_by_user("shopper@example.com").await;

        assert!(result.is_ok());
        let response = result.unwrap();
        assert_eq!(response.email, "shopper@example.com");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.total_items, 2);
        assert_eq!(response.total_price, dec!(200));
    }

    #[tokio::test]
    async fn test_get_cart_not_found() {
        let mut cart_repo = MockTestCartRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service.get_cart_by_user("shopper@example.com").await;

        assert!(matches!(result.unwrap_err(), ServiceError::CartNotFound));
    }

    #[tokio::test]
    async fn test_add_product_creates_cart_lazily() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut product_repo = MockTestProductRepository::new();
        let test_product = create_test_product();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        cart_repo
            .expect_save_cart()
            .withf(|cart| {
                cart.items.len() == 1
                    && cart.items[0].product.id == "P001"
                    && cart.items[0].quantity == 2
                    && cart.version == 0
            })
            .times(1)
            .returning(|cart| {
                Ok(Cart {
                    version: cart.version + 1,
                    ..cart
                })
            });

        product_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq("P001".to_string()))
            .times(1)
            .returning(move |_| Ok(Some(test_product.clone())));

        let service = create_service(
            cart_repo,
            product_repo,
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = AddProductRequest {
            product_id: "P001".to_string(),
            quantity: 2,
        };

        let result = service
            .add_product_to_cart("shopper@example.com", request)
            .await;

        assert!(result.is_ok());
        let response = result.unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].quantity, 2);
        assert_eq!(response.items[0].product.id, "P001");
    }

    #[tokio::test]
    async fn test_add_product_already_in_cart() {
        let mut cart_repo = MockTestCartRepository::new();
        let test_cart = create_test_cart();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));
        // No save_cart expectation: the cart must be left unchanged.

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = AddProductRequest {
            product_id: "P001".to_string(),
            quantity: 3,
        };

        let result = service
            .add_product_to_cart("shopper@example.com", request)
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ProductAlreadyInCart
        ));
    }

    #[tokio::test]
    async fn test_add_product_unknown_in_catalog() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut product_repo = MockTestProductRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        product_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq("P999".to_string()))
            .times(1)
            .returning(|_| Ok(None));

        let service = create_service(
            cart_repo,
            product_repo,
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = AddProductRequest {
            product_id: "P999".to_string(),
            quantity: 1,
        };

        let result = service
            .add_product_to_cart("shopper@example.com", request)
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ProductNotInCatalog
        ));
    }

    #[tokio::test]
    async fn test_update_product_replaces_quantity() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut product_repo = MockTestProductRepository::new();
        let test_cart = create_test_cart();
        let test_product = create_test_product();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        cart_repo
            .expect_save_cart()
            .withf(|cart| cart.items.len() == 1 && cart.items[0].quantity == 5)
            .times(1)
            .returning(|cart| {
                Ok(Cart {
                    version: cart.version + 1,
                    ..cart
                })
            });

        product_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(test_product.clone())));

        let service = create_service(
            cart_repo,
            product_repo,
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = UpdateProductRequest {
            product_id: "P001".to_string(),
            quantity: 5,
        };

        let result = service
            .update_product_in_cart("shopper@example.com", request)
            .await;

        assert!(result.is_ok());
        let response = result.unwrap();
        assert_eq!(response.items[0].quantity, 5);
        assert_eq!(response.total_price, dec!(500));
    }

    #[tokio::test]
    async fn test_update_product_without_cart() {
        let mut cart_repo = MockTestCartRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = UpdateProductRequest {
            product_id: "P001".to_string(),
            quantity: 5,
        };

        let result = service
            .update_product_in_cart("shopper@example.com", request)
            .await;

        assert!(matches!(result.unwrap_err(), ServiceError::CartNotCreated));
    }

    #[tokio::test]
    async fn test_update_product_not_in_cart() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut product_repo = MockTestProductRepository::new();
        let test_cart = create_test_cart();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        product_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| {
                Ok(Some(Product::new(
                    "P002".to_string(),
                    "Tan Leatherette Weekender Duffle".to_string(),
                    "Fashion".to_string(),
                    dec!(31),
                )))
            });

        let service = create_service(
            cart_repo,
            product_repo,
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let request = UpdateProductRequest {
            product_id: "P002".to_string(),
            quantity: 5,
        };

        let result = service
            .update_product_in_cart("shopper@example.com", request)
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ProductNotInCart
        ));
    }

    #[tokio::test]
    async fn test_delete_product_removes_only_targeted_line() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut test_cart = create_test_cart();
        test_cart.add_item(
            Product::new(
                "P002".to_string(),
                "Tan Leatherette Weekender Duffle".to_string(),
                "Fashion".to_string(),
                dec!(31),
            ),
            1,
        );

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        cart_repo
            .expect_save_cart()
            .withf(|cart| cart.items.len() == 1 && cart.items[0].product.id == "P002")
            .times(1)
            .returning(|cart| Ok(cart));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service
            .delete_product_from_cart("shopper@example.com", "P001")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_product_without_cart() {
        let mut cart_repo = MockTestCartRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service
            .delete_product_from_cart("shopper@example.com", "P001")
            .await;

        assert!(matches!(result.unwrap_err(), ServiceError::NoCart));
    }

    #[tokio::test]
    async fn test_delete_product_not_in_cart() {
        let mut cart_repo = MockTestCartRepository::new();
        let test_cart = create_test_cart();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service
            .delete_product_from_cart("shopper@example.com", "P999")
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ProductNotInCart
        ));
    }

    #[tokio::test]
    async fn test_checkout_success_debits_wallet_and_empties_cart() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut user_repo = MockTestUserRepository::new();
        let mut checkout_repo = MockTestCheckoutRepository::new();
        // cart = [{cost=100, qty=2}], wallet=500, address set -> total=200
        let test_cart = create_test_cart();
        let test_user = create_test_user(dec!(500), "221B Baker Street, London");

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        user_repo
            .expect_find_by_email()
            .with(mockall::predicate::eq("shopper@example.com".to_string()))
            .times(1)
            .returning(move |_| Ok(Some(test_user.clone())));

        checkout_repo
            .expect_commit_checkout()
            .withf(|cart, user, expected_wallet| {
                cart.is_empty()
                    && user.wallet_money == dec!(300)
                    && *expected_wallet == dec!(500)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            user_repo,
            checkout_repo,
        );

        let result = service.checkout("shopper@example.com").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let mut cart_repo = MockTestCartRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(Some(Cart::new("shopper@example.com".to_string()))));
        // No user lookup and no commit: the chain stops at the empty cart.

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service.checkout("shopper@example.com").await;

        assert!(matches!(result.unwrap_err(), ServiceError::EmptyCart));
    }

    #[tokio::test]
    async fn test_checkout_insufficient_balance() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut user_repo = MockTestUserRepository::new();
        let test_cart = create_test_cart();
        // total=200, wallet=150
        let test_user = create_test_user(dec!(150), "221B Baker Street, London");

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        user_repo
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(test_user.clone())));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            user_repo,
            MockTestCheckoutRepository::new(),
        );

        let result = service.checkout("shopper@example.com").await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::InsufficientBalance
        ));
    }

    #[tokio::test]
    async fn test_checkout_address_checked_after_balance() {
        let mut cart_repo = MockTestCartRepository::new();
        let mut user_repo = MockTestUserRepository::new();
        let test_cart = create_test_cart();
        // Balance covers the total, but the address is still the sentinel.
        let test_user = create_test_user(dec!(500), DEFAULT_ADDRESS);

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(move |_| Ok(Some(test_cart.clone())));

        user_repo
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(test_user.clone())));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            user_repo,
            MockTestCheckoutRepository::new(),
        );

        let result = service.checkout("shopper@example.com").await;

        assert!(matches!(result.unwrap_err(), ServiceError::AddressNotSet));
    }

    #[tokio::test]
    async fn test_checkout_without_cart() {
        let mut cart_repo = MockTestCartRepository::new();

        cart_repo
            .expect_find_cart()
            .times(1)
            .returning(|_| Ok(None));

        let service = create_service(
            cart_repo,
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        let result = service.checkout("shopper@example.com").await;

        assert!(matches!(result.unwrap_err(), ServiceError::CartNotFound));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let service = create_service(
            MockTestCartRepository::new(),
            MockTestProductRepository::new(),
            MockTestUserRepository::new(),
            MockTestCheckoutRepository::new(),
        );

        // Empty email
        let result = service.get_cart_by_user("").await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));

        // Zero quantity
        let request = AddProductRequest {
            product_id: "P001".to_string(),
            quantity: 0,
        };
        let result = service
            .add_product_to_cart("shopper@example.com", request)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::InvalidQuantity { quantity: 0 }
        ));

        // Excessive quantity
        let request = AddProductRequest {
            product_id: "P001".to_string(),
            quantity: 101,
        };
        let result = service
            .add_product_to_cart("shopper@example.com", request)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));

        // Empty product id
        let result = service
            .delete_product_from_cart("shopper@example.com", " ")
            .await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));
    }
}
