use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storefront account record.
///
/// Owned by the account subsystem; the cart service only reads and debits
/// `wallet_money` and reads the address flag. The address holds a sentinel
/// value until the user sets a real shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub wallet_money: Decimal,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, wallet_money: Decimal, address: String) -> Self {
        let now = Utc::now();
        Self {
            email,
            name,
            wallet_money,
            address,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once the user has replaced the sentinel with a real shipping
    /// address.
    pub fn has_set_non_default_address(&self, default_address: &str) -> bool {
        self.address != default_address
    }

    /// Debit the wallet, updating the modification timestamp.
    pub fn debit_wallet(&mut self, amount: Decimal) {
        self.wallet_money -= amount;
        self.updated_at = Utc::now();
    }
}
