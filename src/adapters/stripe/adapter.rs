//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait on top of the Stripe REST API.
//! Each method translates port parameters into Stripe's form encoding and
//! maps the response back into port types.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::webhook::WebhookEvent;
use crate::ports::{
    CheckoutMode, CheckoutSession, CheckoutSessionSummary, CreateCheckoutSessionParams,
    CreateCustomerParams, CreatePaymentIntentParams, CreateSubscriptionParams, Customer,
    PaymentError, PaymentIntent, PaymentMethod, PaymentMethodKind, PaymentProvider, Subscription,
    SubscriptionStatus, UpdateCustomerParams, UpdateSubscriptionParams,
};

use super::client::{resource_path, StripeClient};
use super::form::{key, FormParams};
use super::signature::WebhookVerifier;
use super::types::{
    StripeCheckoutSession, StripeCustomer, StripeList, StripePaymentIntent, StripePaymentMethod,
    StripeSubscription,
};
use super::StripeConfig;

/// Page size for list calls.
const LIST_LIMIT: u32 = 100;

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    client: StripeClient,
    verifier: WebhookVerifier,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let verifier = WebhookVerifier::new(config.webhook_secret.clone(), config.require_livemode);
        Ok(Self {
            client: StripeClient::new(config)?,
            verifier,
        })
    }

    pub fn config(&self) -> &StripeConfig {
        self.client.config()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Form encoding
// ════════════════════════════════════════════════════════════════════════════════

fn checkout_session_form(params: &CreateCheckoutSessionParams) -> FormParams {
    let mut form = FormParams::new();
    form.push("mode", params.mode.as_str())
        .push("success_url", &params.success_url)
        .push("cancel_url", &params.cancel_url)
        .push("automatic_tax[enabled]", true);

    if params.payment_method_types.is_empty() {
        form.push_list("payment_method_types", &["card"]);
    } else {
        form.push_list("payment_method_types", &params.payment_method_types);
    }

    for (i, item) in params.line_items.iter().enumerate() {
        let idx = i.to_string();
        form.push_opt(key(&["line_items", &idx, "price"]), item.price.as_ref())
            .push(key(&["line_items", &idx, "quantity"]), item.quantity);

        if let Some(data) = &item.price_data {
            form.push(key(&["line_items", &idx, "price_data", "currency"]), &data.currency)
                .push(
                    key(&["line_items", &idx, "price_data", "product_data", "name"]),
                    &data.product_name,
                )
                .push_opt(
                    key(&["line_items", &idx, "price_data", "product_data", "description"]),
                    data.product_description.as_ref(),
                )
                .push(key(&["line_items", &idx, "price_data", "unit_amount"]), data.unit_amount);

            if let Some(recurring) = &data.recurring {
                form.push(
                    key(&["line_items", &idx, "price_data", "recurring", "interval"]),
                    recurring.interval.as_str(),
                )
                .push_opt(
                    key(&["line_items", &idx, "price_data", "recurring", "interval_count"]),
                    recurring.interval_count,
                );
            }
        }
    }

    form.push_opt("customer_email", params.customer_email.as_ref())
        .push_opt("customer", params.customer_id.as_ref())
        .push_metadata("metadata", &params.metadata);

    if params.allow_promotion_codes {
        form.push("allow_promotion_codes", true);
    }

    if params.mode == CheckoutMode::Subscription {
        form.push("payment_method_collection", "if_required")
            .push("payment_method_options[card][setup_future_usage]", "off_session");
    }

    form
}

fn create_customer_form(params: &CreateCustomerParams) -> FormParams {
    let mut form = FormParams::new();
    form.push("email", &params.email)
        .push_opt("name", params.name.as_ref())
        .push_opt("phone", params.phone.as_ref())
        .push_opt("description", params.description.as_ref())
        .push_opt("payment_method", params.payment_method.as_ref())
        .push_metadata("metadata", &params.metadata);
    form
}

fn update_customer_form(params: &UpdateCustomerParams) -> FormParams {
    let mut form = FormParams::new();
    form.push_opt("email", params.email.as_ref())
        .push_opt("name", params.name.as_ref())
        .push_opt("phone", params.phone.as_ref())
        .push_opt("description", params.description.as_ref())
        .push_opt(
            "invoice_settings[default_payment_method]",
            params.default_payment_method.as_ref(),
        );
    if let Some(metadata) = &params.metadata {
        form.push_metadata("metadata", metadata);
    }
    form
}

fn create_subscription_form(params: &CreateSubscriptionParams) -> FormParams {
    let mut form = FormParams::new();
    form.push("customer", &params.customer_id);

    for (i, item) in params.items.iter().enumerate() {
        let idx = i.to_string();
        form.push(key(&["items", &idx, "price"]), &item.price)
            .push(key(&["items", &idx, "quantity"]), item.quantity.unwrap_or(1));
    }

    form.push_metadata("metadata", &params.metadata)
        .push_opt("trial_period_days", params.trial_period_days)
        .push_opt("default_payment_method", params.default_payment_method.as_ref())
        .push("payment_behavior", "default_incomplete")
        .push("payment_settings[payment_method_types][]", "card")
        .push("payment_settings[save_default_payment_method]", "on_subscription")
        .push_list("expand", &["latest_invoice.payment_intent"]);
    form
}

fn update_subscription_form(params: &UpdateSubscriptionParams) -> FormParams {
    let mut form = FormParams::new();

    if let Some(items) = &params.items {
        for (i, item) in items.iter().enumerate() {
            let idx = i.to_string();
            form.push_opt(key(&["items", &idx, "id"]), item.id.as_ref())
                .push(key(&["items", &idx, "price"]), &item.price)
                .push(key(&["items", &idx, "quantity"]), item.quantity.unwrap_or(1));
        }
    }
    if let Some(metadata) = &params.metadata {
        form.push_metadata("metadata", metadata);
    }
    form.push_opt("cancel_at_period_end", params.cancel_at_period_end)
        .push_opt("default_payment_method", params.default_payment_method.as_ref());
    form
}

fn payment_intent_form(params: &CreatePaymentIntentParams) -> FormParams {
    let mut form = FormParams::new();
    form.push("amount", params.amount)
        .push("currency", &params.currency)
        .push_opt("description", params.description.as_ref())
        .push_opt("receipt_email", params.receipt_email.as_ref())
        .push_metadata("metadata", &params.metadata);
    form
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        params: CreateCheckoutSessionParams,
    ) -> Result<CheckoutSessionSummary, PaymentError> {
        let session: StripeCheckoutSession = self
            .client
            .post("/v1/checkout/sessions", &checkout_session_form(&params))
            .await?;

        tracing::info!(session_id = %session.id, mode = params.mode.as_str(), "Created checkout session");
        Ok(session.summary())
    }

    async fn get_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let session: StripeCheckoutSession = self
            .client
            .get(&resource_path(&["checkout", "sessions", session_id])?, &FormParams::new())
            .await?;
        Ok(session.into())
    }

    async fn expire_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let session: StripeCheckoutSession = self
            .client
            .post(&resource_path(&["checkout", "sessions", session_id, "expire"])?, &FormParams::new())
            .await?;

        tracing::info!(session_id, "Expired checkout session");
        Ok(session.into())
    }

    async fn create_customer(&self, params: CreateCustomerParams) -> Result<Customer, PaymentError> {
        let customer: StripeCustomer = self
            .client
            .post("/v1/customers", &create_customer_form(&params))
            .await?;

        tracing::info!(customer_id = %customer.id, "Created customer");
        Ok(customer.into())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Customer, PaymentError> {
        let customer: StripeCustomer = self
            .client
            .get(&resource_path(&["customers", customer_id])?, &FormParams::new())
            .await?;

        if customer.deleted {
            tracing::warn!(customer_id, "Customer has been deleted");
            return Err(PaymentError::not_found("Customer"));
        }
        Ok(customer.into())
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        params: UpdateCustomerParams,
    ) -> Result<Customer, PaymentError> {
        let customer: StripeCustomer = self
            .client
            .post(&resource_path(&["customers", customer_id])?, &update_customer_form(&params))
            .await?;

        tracing::info!(customer_id, "Updated customer");
        Ok(customer.into())
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError> {
        let _: StripeCustomer = self
            .client
            .delete(&resource_path(&["customers", customer_id])?)
            .await?;

        tracing::info!(customer_id, "Deleted customer");
        Ok(())
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        kind: PaymentMethodKind,
    ) -> Result<Vec<PaymentMethod>, PaymentError> {
        let mut query = FormParams::new();
        query
            .push("customer", customer_id)
            .push("type", kind.as_str())
            .push("limit", LIST_LIMIT);

        let list: StripeList<StripePaymentMethod> =
            self.client.get("/v1/payment_methods", &query).await?;
        Ok(list.data.into_iter().map(Into::into).collect())
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        let mut form = FormParams::new();
        form.push("customer", customer_id);

        let method: StripePaymentMethod = self
            .client
            .post(&resource_path(&["payment_methods", payment_method_id, "attach"])?, &form)
            .await?;

        tracing::info!(payment_method_id, customer_id, "Attached payment method");
        Ok(method.into())
    }

    async fn detach_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        let method: StripePaymentMethod = self
            .client
            .post(
                &resource_path(&["payment_methods", payment_method_id, "detach"])?,
                &FormParams::new(),
            )
            .await?;

        tracing::info!(payment_method_id, "Detached payment method");
        Ok(method.into())
    }

    async fn create_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        let sub: StripeSubscription = self
            .client
            .post("/v1/subscriptions", &create_subscription_form(&params))
            .await?;

        tracing::info!(
            subscription_id = %sub.id,
            customer_id = %params.customer_id,
            status = sub.status.as_str(),
            "Created subscription"
        );
        Ok(sub.into())
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, PaymentError> {
        let sub: StripeSubscription = self
            .client
            .get(&resource_path(&["subscriptions", subscription_id])?, &FormParams::new())
            .await?;
        Ok(sub.into())
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        params: UpdateSubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        let sub: StripeSubscription = self
            .client
            .post(
                &resource_path(&["subscriptions", subscription_id])?,
                &update_subscription_form(&params),
            )
            .await?;

        tracing::info!(subscription_id, status = sub.status.as_str(), "Updated subscription");
        Ok(sub.into())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediate: bool,
    ) -> Result<Subscription, PaymentError> {
        let path = resource_path(&["subscriptions", subscription_id])?;
        let sub: StripeSubscription = if immediate {
            self.client.delete(&path).await?
        } else {
            let mut form = FormParams::new();
            form.push("cancel_at_period_end", true);
            self.client.post(&path, &form).await?
        };

        tracing::info!(subscription_id, immediate, "Canceled subscription");
        Ok(sub.into())
    }

    async fn resume_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, PaymentError> {
        let mut form = FormParams::new();
        form.push("cancel_at_period_end", false);

        let sub: StripeSubscription = self
            .client
            .post(&resource_path(&["subscriptions", subscription_id])?, &form)
            .await?;

        tracing::info!(subscription_id, "Resumed subscription");
        Ok(sub.into())
    }

    async fn list_customer_subscriptions(
        &self,
        customer_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> Result<Vec<Subscription>, PaymentError> {
        let mut query = FormParams::new();
        query
            .push("customer", customer_id)
            .push_opt("status", status.map(|s| s.as_str()))
            .push("limit", LIST_LIMIT);

        let list: StripeList<StripeSubscription> = self.client.get("/v1/subscriptions", &query).await?;
        Ok(list.data.into_iter().map(Into::into).collect())
    }

    async fn create_payment_intent(
        &self,
        params: CreatePaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        let intent: StripePaymentIntent = self
            .client
            .post("/v1/payment_intents", &payment_intent_form(&params))
            .await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Created payment intent"
        );
        Ok(intent.into())
    }

    async fn construct_webhook_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.verifier
            .verify(payload, signature, Utc::now().timestamp())
    }
}
