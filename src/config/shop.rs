//! Storefront checkout configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ValidationError;

/// Settings for the storefront's own checkout flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    /// ISO 4217 currency code, lowercase as Stripe expects
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Flat shipping charge applied to any non-empty cart
    #[serde(default = "default_shipping_flat_rate")]
    pub shipping_flat_rate: Decimal,

    /// Description attached to storefront payment intents
    #[serde(default = "default_payment_description")]
    pub payment_description: String,
}

impl ShopConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let valid_currency =
            self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_lowercase());
        if !valid_currency {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        if self.shipping_flat_rate.is_sign_negative() {
            return Err(ValidationError::NegativeShippingRate);
        }
        Ok(())
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            shipping_flat_rate: default_shipping_flat_rate(),
            payment_description: default_payment_description(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_shipping_flat_rate() -> Decimal {
    Decimal::new(1000, 2)
}

fn default_payment_description() -> String {
    "Jewelry purchase".to_string()
}
