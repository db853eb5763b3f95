//! CreatePaymentIntentHandler - Command handler for storefront checkout.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::ShopConfig;
use crate::domain::cart::{Cart, CartError, LineItem, ProductId};
use crate::ports::{CreatePaymentIntentParams, Metadata, PaymentError, PaymentProvider};

/// Provider limit on a single metadata value.
const MAX_METADATA_VALUE_LEN: usize = 500;

/// Command to open a payment intent for the submitted cart.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub items: Vec<LineItem>,
    /// Billing email, used for the receipt.
    pub receipt_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntentResult {
    pub payment_intent_id: String,
    pub client_secret: String,
    /// Charged amount in minor units.
    pub amount: i64,
}

#[derive(Debug, Error)]
pub enum PaymentIntentError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    InvalidCart(#[from] CartError),

    #[error("Payment intent {0} has no client secret")]
    MissingClientSecret(String),

    #[error(transparent)]
    Provider(#[from] PaymentError),
}

/// Item summary stored in payment intent metadata.
#[derive(Serialize)]
struct ItemSummary<'a> {
    id: ProductId,
    name: &'a str,
    price: rust_decimal::Decimal,
    quantity: u32,
}

/// Charges the cart total, shipping included, through the payment provider.
pub struct CreatePaymentIntentHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    shop: ShopConfig,
}

impl CreatePaymentIntentHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, shop: ShopConfig) -> Self {
        Self {
            payment_provider,
            shop,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, PaymentIntentError> {
        if cmd.items.is_empty() {
            return Err(PaymentIntentError::EmptyCart);
        }

        let cart = Cart::from_items(cmd.items, self.shop.shipping_flat_rate);
        let amount = cart.total_minor_units()?;

        let params = CreatePaymentIntentParams {
            amount,
            currency: self.shop.currency.clone(),
            description: Some(self.shop.payment_description.clone()),
            receipt_email: cmd.receipt_email.filter(|e| !e.trim().is_empty()),
            metadata: cart_metadata(&cart)?,
        };

        let intent = self.payment_provider.create_payment_intent(params).await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            amount,
            items = cart.item_count(),
            "Created storefront payment intent"
        );

        let client_secret = intent
            .client_secret
            .ok_or_else(|| PaymentIntentError::MissingClientSecret(intent.id.clone()))?;

        Ok(CreatePaymentIntentResult {
            payment_intent_id: intent.id,
            client_secret,
            amount,
        })
    }
}

fn cart_metadata(cart: &Cart) -> Result<Metadata, CartError> {
    let summary: Vec<ItemSummary<'_>> = cart
        .items()
        .iter()
        .map(|item| ItemSummary {
            id: item.product_id,
            name: &item.name,
            price: item.unit_price,
            quantity: item.quantity,
        })
        .collect();

    let mut items = serde_json::to_string(&summary)?;
    if items.len() > MAX_METADATA_VALUE_LEN {
        items = format!("{} items", cart.item_count());
    }

    let mut metadata = Metadata::new();
    metadata.insert("integration_check".to_string(), "accept_a_payment".to_string());
    metadata.insert("items".to_string(), items);
    Ok(metadata)
}
