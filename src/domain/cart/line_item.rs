//! Cart line items.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartError;

/// Storefront product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One product line in the cart.
///
/// Field names on the wire match the storefront's stored layout
/// (`id`, `name`, `price`, `quantity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,

    pub name: String,

    /// Price of a single unit in the shop currency's major unit.
    #[serde(rename = "price")]
    pub unit_price: Decimal,

    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity: 1,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Unit price times quantity. Fails when the product exceeds `Decimal`'s range.
    pub fn line_total(&self) -> Result<Decimal, CartError> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| {
                CartError::AmountOutOfRange(format!("{} x {}", self.unit_price, self.quantity))
            })
    }
}
