use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product.
///
/// The catalog is the read-only source of truth for product existence and
/// cost. Carts hold a copy of this record captured at add-time; the copy is
/// never refreshed, so a later catalog price change does not affect lines
/// already in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub cost: Decimal,
    pub rating: Option<u32>,
    pub image: Option<String>,
}

impl Product {
    pub fn new(id: String, name: String, category: String, cost: Decimal) -> Self {
        Self {
            id,
            name,
            category,
            cost,
            rating: None,
            image: None,
        }
    }
}
