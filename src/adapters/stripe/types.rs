//! Stripe API objects as they arrive over the wire.
//!
//! These types parse actual Stripe JSON and map into the port types.
//! Fields Stripe may omit or null are optional.

use serde::Deserialize;
use serde_json::Value;

use crate::ports::{
    CardDetails, CheckoutSession, CheckoutSessionSummary, Customer, Metadata, PaymentIntent,
    PaymentMethod, Subscription, SubscriptionItem, SubscriptionStatus,
};

/// A field Stripe returns either as an id or as the expanded object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object(Value),
}

impl Expandable {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Object(obj) => obj.get("id").and_then(Value::as_str),
        }
    }
}

fn expandable_id(field: &Option<Expandable>) -> Option<String> {
    field.as_ref().and_then(Expandable::id).map(str::to_string)
}

/// List envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer: Option<Expandable>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub subscription: Option<Expandable>,
    #[serde(default)]
    pub payment_intent: Option<Expandable>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl StripeCheckoutSession {
    pub fn summary(&self) -> CheckoutSessionSummary {
        CheckoutSessionSummary {
            id: self.id.clone(),
            url: self.url.clone(),
            status: self.status.clone().unwrap_or_else(|| "open".to_string()),
        }
    }
}

impl From<StripeCheckoutSession> for CheckoutSession {
    fn from(s: StripeCheckoutSession) -> Self {
        let customer_email = s
            .customer_email
            .or_else(|| s.customer_details.and_then(|d| d.email));
        Self {
            customer: expandable_id(&s.customer),
            subscription: expandable_id(&s.subscription),
            payment_intent: expandable_id(&s.payment_intent),
            id: s.id,
            url: s.url,
            status: s.status,
            mode: s.mode,
            payment_status: s.payment_status,
            customer_email,
            amount_total: s.amount_total,
            currency: s.currency,
            metadata: s.metadata.unwrap_or_default(),
            expires_at: s.expires_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
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
    pub invoice_settings: Option<InvoiceSettings>,
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceSettings {
    #[serde(default)]
    pub default_payment_method: Option<Expandable>,
}

impl From<StripeCustomer> for Customer {
    fn from(c: StripeCustomer) -> Self {
        Self {
            default_payment_method: c
                .invoice_settings
                .and_then(|s| expandable_id(&s.default_payment_method)),
            id: c.id,
            email: c.email,
            name: c.name,
            phone: c.phone,
            description: c.description,
            metadata: c.metadata.unwrap_or_default(),
            created: c.created,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment methods
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub customer: Option<Expandable>,
    #[serde(default)]
    pub card: Option<StripeCard>,
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCard {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

impl From<StripePaymentMethod> for PaymentMethod {
    fn from(pm: StripePaymentMethod) -> Self {
        Self {
            customer: expandable_id(&pm.customer),
            id: pm.id,
            kind: pm.kind,
            card: pm.card.map(|c| CardDetails {
                brand: c.brand,
                last4: c.last4,
                exp_month: c.exp_month,
                exp_year: c.exp_year,
            }),
            created: pm.created,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: Expandable,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Expanded with `latest_invoice.payment_intent` on create.
    #[serde(default)]
    pub latest_invoice: Option<Expandable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

fn default_quantity() -> u32 {
    1
}

impl StripeSubscription {
    /// Client secret of the latest invoice's payment intent, when expanded.
    fn client_secret(&self) -> Option<String> {
        match &self.latest_invoice {
            Some(Expandable::Object(invoice)) => invoice
                .get("payment_intent")
                .and_then(|pi| pi.get("client_secret"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}

impl From<StripeSubscription> for Subscription {
    fn from(s: StripeSubscription) -> Self {
        let client_secret = s.client_secret();
        Self {
            customer: s.customer.id().unwrap_or_default().to_string(),
            id: s.id,
            status: s.status,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
            cancel_at_period_end: s.cancel_at_period_end,
            canceled_at: s.canceled_at,
            trial_end: s.trial_end,
            items: s
                .items
                .map(|list| list.data)
                .unwrap_or_default()
                .into_iter()
                .map(|item| SubscriptionItem {
                    id: item.id,
                    price: item.price.id,
                    quantity: item.quantity,
                })
                .collect(),
            metadata: s.metadata.unwrap_or_default(),
            client_secret,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment intents
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        Self {
            id: pi.id,
            client_secret: pi.client_secret,
            amount: pi.amount,
            currency: pi.currency,
            status: pi.status,
        }
    }
}
