//! HTTP DTOs (Data Transfer Objects) for the Stripe gateway endpoints.
//!
//! Request bodies use camelCase field names. Responses carry the
//! provider-neutral port types as they are, in the provider's snake_case
//! layout.

use serde::{Deserialize, Serialize};

use crate::ports::{
    CheckoutLineItem, CheckoutMode, CreateCheckoutSessionParams, CreateCustomerParams,
    CreateSubscriptionParams, Metadata, PaymentMethodKind, PriceData, Recurring,
    RecurringInterval, SubscriptionItemParams, SubscriptionStatus, UpdateCustomerParams,
    UpdateSubscriptionItemParams, UpdateSubscriptionParams,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    pub mode: CheckoutMode,
    pub line_items: Vec<CheckoutLineItemRequest>,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub allow_promotion_codes: bool,
    /// Defaults to `["card"]` when omitted.
    #[serde(default)]
    pub payment_method_types: Option<Vec<String>>,
}

/// One line of a checkout session: a stored price or inline price data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItemRequest {
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub price_data: Option<PriceDataRequest>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDataRequest {
    pub currency: String,
    pub product_data: ProductDataRequest,
    /// Amount in minor units.
    pub unit_amount: i64,
    #[serde(default)]
    pub recurring: Option<RecurringRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDataRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRequest {
    pub interval: RecurringInterval,
    #[serde(default)]
    pub interval_count: Option<u32>,
}

/// Request to create a customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Payment method to attach and make the invoice default.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Request to update a customer. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachPaymentMethodRequest {
    pub payment_method_id: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachPaymentMethodRequest {
    pub payment_method_id: String,
}

/// Query for `GET /customers/:id/payment-methods`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPaymentMethodsQuery {
    #[serde(rename = "type", default)]
    pub kind: PaymentMethodKind,
}

/// Request to create a subscription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub items: Vec<SubscriptionItemRequest>,
    /// Accepted as an alias for `defaultPaymentMethod`.
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItemRequest {
    pub price: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Request to update a subscription. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    pub items: Option<Vec<UpdateSubscriptionItemRequest>>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub cancel_at_period_end: Option<bool>,
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubscriptionItemRequest {
    /// Existing subscription item to change; absent adds a new item.
    #[serde(default)]
    pub id: Option<String>,
    pub price: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Request to cancel a subscription.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelSubscriptionRequest {
    /// Whether to cancel immediately or at period end.
    #[serde(default)]
    pub immediate: bool,
}

/// Query for `GET /subscriptions/customer/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSubscriptionsQuery {
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// List wrapper: `{"data": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookReceivedResponse {
    pub received: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishableKeyResponse {
    pub publishable_key: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Conversions
// ════════════════════════════════════════════════════════════════════════════════

impl From<CreateCheckoutSessionRequest> for CreateCheckoutSessionParams {
    fn from(req: CreateCheckoutSessionRequest) -> Self {
        Self {
            mode: req.mode,
            line_items: req.line_items.into_iter().map(Into::into).collect(),
            success_url: req.success_url,
            cancel_url: req.cancel_url,
            customer_email: req.customer_email,
            customer_id: req.customer_id,
            metadata: req.metadata,
            allow_promotion_codes: req.allow_promotion_codes,
            payment_method_types: req.payment_method_types.unwrap_or_default(),
        }
    }
}

impl From<CheckoutLineItemRequest> for CheckoutLineItem {
    fn from(item: CheckoutLineItemRequest) -> Self {
        Self {
            price: item.price,
            price_data: item.price_data.map(|data| PriceData {
                currency: data.currency,
                product_name: data.product_data.name,
                product_description: data.product_data.description,
                unit_amount: data.unit_amount,
                recurring: data.recurring.map(|r| Recurring {
                    interval: r.interval,
                    interval_count: r.interval_count,
                }),
            }),
            quantity: item.quantity,
        }
    }
}

impl From<CreateCustomerRequest> for CreateCustomerParams {
    fn from(req: CreateCustomerRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            phone: req.phone,
            description: req.description,
            metadata: req.metadata,
            payment_method: req.payment_method,
        }
    }
}

impl From<UpdateCustomerRequest> for UpdateCustomerParams {
    fn from(req: UpdateCustomerRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            phone: req.phone,
            description: req.description,
            metadata: req.metadata,
            default_payment_method: req.default_payment_method,
        }
    }
}

impl From<CreateSubscriptionRequest> for CreateSubscriptionParams {
    fn from(req: CreateSubscriptionRequest) -> Self {
        Self {
            customer_id: req.customer_id,
            items: req
                .items
                .into_iter()
                .map(|item| SubscriptionItemParams {
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            metadata: req.metadata,
            trial_period_days: req.trial_period_days,
            default_payment_method: req.default_payment_method.or(req.payment_method),
        }
    }
}

impl From<UpdateSubscriptionRequest> for UpdateSubscriptionParams {
    fn from(req: UpdateSubscriptionRequest) -> Self {
        Self {
            items: req.items.map(|items| {
                items
                    .into_iter()
                    .map(|item| UpdateSubscriptionItemParams {
                        id: item.id,
                        price: item.price,
                        quantity: item.quantity,
                    })
                    .collect()
            }),
            metadata: req.metadata,
            cancel_at_period_end: req.cancel_at_period_end,
            default_payment_method: req.default_payment_method,
        }
    }
}
