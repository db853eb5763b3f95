//! Payment provider port for external payment processing.
//!
//! Defines the contract for payment gateway integrations (e.g., Stripe).
//! Every operation is a parameter translation onto one provider call; the
//! provider owns all checkout, customer and subscription state.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::webhook::WebhookEvent;

/// Free-form key/value metadata attached to provider objects.
pub type Metadata = BTreeMap<String, String>;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    // ─── Checkout sessions ─────────────────────────────────────────────

    /// Create a hosted checkout session.
    async fn create_checkout_session(
        &self,
        params: CreateCheckoutSessionParams,
    ) -> Result<CheckoutSessionSummary, PaymentError>;

    async fn get_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError>;

    /// Expire an open checkout session so it can no longer be paid.
    async fn expire_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError>;

    // ─── Customers ─────────────────────────────────────────────────────

    async fn create_customer(&self, params: CreateCustomerParams) -> Result<Customer, PaymentError>;

    /// Get a customer. Deleted customers are reported as `NotFound`.
    async fn get_customer(&self, customer_id: &str) -> Result<Customer, PaymentError>;

    async fn update_customer(
        &self,
        customer_id: &str,
        params: UpdateCustomerParams,
    ) -> Result<Customer, PaymentError>;

    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError>;

    // ─── Payment methods ───────────────────────────────────────────────

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        kind: PaymentMethodKind,
    ) -> Result<Vec<PaymentMethod>, PaymentError>;

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError>;

    async fn detach_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError>;

    // ─── Subscriptions ─────────────────────────────────────────────────

    async fn create_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<Subscription, PaymentError>;

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, PaymentError>;

    async fn update_subscription(
        &self,
        subscription_id: &str,
        params: UpdateSubscriptionParams,
    ) -> Result<Subscription, PaymentError>;

    /// Cancel a subscription.
    ///
    /// `immediate` ends it now; otherwise it is flagged to cancel at period end.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediate: bool,
    ) -> Result<Subscription, PaymentError>;

    /// Undo a pending cancel-at-period-end.
    async fn resume_subscription(&self, subscription_id: &str)
        -> Result<Subscription, PaymentError>;

    async fn list_customer_subscriptions(
        &self,
        customer_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> Result<Vec<Subscription>, PaymentError>;

    // ─── Payment intents ───────────────────────────────────────────────

    async fn create_payment_intent(
        &self,
        params: CreatePaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError>;

    // ─── Webhooks ──────────────────────────────────────────────────────

    /// Verify a webhook signature and parse the event.
    async fn construct_webhook_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Day,
    Week,
    Month,
    Year,
}

impl RecurringInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringInterval::Day => "day",
            RecurringInterval::Week => "week",
            RecurringInterval::Month => "month",
            RecurringInterval::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurring {
    pub interval: RecurringInterval,
    pub interval_count: Option<u32>,
}

/// Inline price definition for a checkout line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceData {
    pub currency: String,
    pub product_name: String,
    pub product_description: Option<String>,
    /// Unit amount in minor units.
    pub unit_amount: i64,
    pub recurring: Option<Recurring>,
}

/// A checkout line item: either an existing price id or inline price data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub price: Option<String>,
    pub price_data: Option<PriceData>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutSessionParams {
    pub mode: CheckoutMode,
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub customer_id: Option<String>,
    pub metadata: Metadata,
    pub allow_promotion_codes: bool,
    /// Defaults to `["card"]` when empty.
    pub payment_method_types: Vec<String>,
}

/// Minimal view returned when a session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionSummary {
    pub id: String,
    pub url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub status: Option<String>,
    pub mode: Option<String>,
    pub payment_status: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub subscription: Option<String>,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: Metadata,
    pub expires_at: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers & payment methods
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCustomerParams {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub metadata: Metadata,
    /// Payment method to attach on creation.
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCustomerParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Metadata>,
    /// Sets the invoice default payment method.
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub metadata: Metadata,
    pub default_payment_method: Option<String>,
    /// Provider creation timestamp (Unix seconds).
    pub created: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    #[default]
    Card,
    UsBankAccount,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::Card => "card",
            PaymentMethodKind::UsBankAccount => "us_bank_account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub customer: Option<String>,
    pub card: Option<CardDetails>,
    pub created: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription status from payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Incomplete,
    IncompleteExpired,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Paused,
    /// Unknown status from provider.
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Unknown => "unknown",
        }
    }

    /// Check if subscription grants access.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing | SubscriptionStatus::PastDue
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionItemParams {
    pub price: String,
    /// Defaults to 1.
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionParams {
    pub customer_id: String,
    pub items: Vec<SubscriptionItemParams>,
    pub metadata: Metadata,
    pub trial_period_days: Option<u32>,
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSubscriptionItemParams {
    /// Existing subscription item to change; absent adds a new item.
    pub id: Option<String>,
    pub price: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubscriptionParams {
    pub items: Option<Vec<UpdateSubscriptionItemParams>>,
    pub metadata: Option<Metadata>,
    pub cancel_at_period_end: Option<bool>,
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub price: String,
    pub quantity: u32,
}

/// Subscription in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub trial_end: Option<i64>,
    pub items: Vec<SubscriptionItem>,
    pub metadata: Metadata,
    /// Client secret of the first invoice's payment intent, for confirming
    /// an incomplete subscription in the browser.
    pub client_secret: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment intents
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntentParams {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub receipt_email: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CardDeclined, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    /// A required provider setting is absent.
    pub fn not_configured(setting: &str) -> Self {
        Self::new(
            PaymentErrorCode::WebhookSecretMissing,
            format!("{} not configured", setting),
        )
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    /// Signature or payload problems with an incoming webhook.
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(
            self.code,
            PaymentErrorCode::InvalidWebhook | PaymentErrorCode::WebhookSecretMissing
        )
    }
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Card was declined.
    CardDeclined,

    /// Provider rejected the request parameters.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid webhook signature or payload.
    InvalidWebhook,

    /// Webhook received but no signing secret is configured.
    WebhookSecretMissing,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::CardDeclined => "card_declined",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidWebhook => "invalid_webhook",
            PaymentErrorCode::WebhookSecretMissing => "webhook_secret_missing",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
