use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;

/// Shopping cart for a storefront user, keyed by email.
///
/// `version` is an optimistic-concurrency token: it starts at 0 for a cart
/// that has never been persisted and the repository increments it on every
/// successful save. A save conditioned on a stale version fails instead of
/// overwriting a concurrent writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub email: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

/// One line item: a product snapshot captured at add-time plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Request model for adding a product to the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProductRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Request model for replacing a line's quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Request model for removing a line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveProductRequest {
    pub product_id: String,
}

/// Response model for cart operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub email: String,
    pub items: Vec<CartItemResponse>,
    pub total_items: u32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line in responses, with the line total precomputed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl Cart {
    /// Create a new empty cart for a user
    pub fn new(email: String) -> Self {
        let now = Utc::now();
        Self {
            email,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Append a new line item with the given product snapshot.
    ///
    /// Callers must check `contains_item` first; a duplicate product id is a
    /// business-rule violation handled at the service layer, not here.
    pub fn add_item(&mut self, product: Product, quantity: u32) {
        self.items.push(CartItem { product, quantity });
        self.updated_at = Utc::now();
    }

    /// Replace the quantity of an existing line in place. Returns false if
    /// no line references the product id.
    pub fn update_item_quantity(&mut self, product_id: &str, new_quantity: u32) -> bool {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product_id)
        {
            item.quantity = new_quantity;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }

    /// Remove a line from the cart. Returns false if no line references the
    /// product id.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        let removed = self.items.len() != original_len;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Clear all items from the cart
    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }

    /// Get the total number of units across all lines
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Total cost of the cart: sum over lines of snapshot cost x quantity
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(|item| item.line_total()).sum()
    }

    /// Check if the cart has no line items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a specific line by product id
    pub fn get_item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Membership check shared by add/update/delete: a product is in the
    /// cart iff some line's product id equals the given id.
    pub fn contains_item(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product.id == product_id)
    }

    /// Build the response representation
    pub fn to_response(&self) -> CartResponse {
        CartResponse {
            email: self.email.clone(),
            items: self
                .items
                .iter()
                .map(|item| CartItemResponse {
                    product: item.product.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            total_items: self.total_items(),
            total_price: self.total_price(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CartItem {
    /// Line total: snapshot cost x quantity
    pub fn line_total(&self) -> Decimal {
        self.product.cost * Decimal::from(self.quantity)
    }
}
