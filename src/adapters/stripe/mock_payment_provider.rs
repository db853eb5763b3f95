//! Mock payment provider for testing.
//!
//! Provides a configurable in-memory implementation of `PaymentProvider` for
//! unit and integration tests and for running the server without Stripe
//! credentials. Supports:
//! - An in-memory object store (customers, sessions, subscriptions, methods)
//! - Error injection
//! - Call tracking
//! - Webhook event simulation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::webhook::WebhookEvent;
use crate::ports::{
    CardDetails, CheckoutMode, CheckoutSession, CheckoutSessionSummary,
    CreateCheckoutSessionParams, CreateCustomerParams, CreatePaymentIntentParams,
    CreateSubscriptionParams, Customer, PaymentError, PaymentIntent, PaymentMethod,
    PaymentMethodKind, PaymentProvider, Subscription, SubscriptionItem, SubscriptionStatus,
    UpdateCustomerParams, UpdateSubscriptionParams,
};

/// Mock payment provider for testing.
///
/// Clones share state, so a test can keep a handle while the router owns
/// another.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
///
/// // Seed objects
/// mock.add_customer(customer);
///
/// // Inject errors
/// mock.set_method_error("get_customer", PaymentError::not_found("Customer"));
///
/// // Assert
/// assert!(mock.was_called("get_customer"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    customers: HashMap<String, Customer>,
    deleted_customers: Vec<String>,
    checkout_sessions: HashMap<String, CheckoutSession>,
    subscriptions: HashMap<String, Subscription>,
    payment_methods: HashMap<String, PaymentMethod>,

    /// Payment intent requests in call order.
    payment_intents: Vec<CreatePaymentIntentParams>,

    /// Event returned by webhook verification instead of parsing the payload.
    next_webhook_event: Option<WebhookEvent>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,
    webhook_verify_mode: WebhookVerifyMode,
    id_counter: u64,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Default, Clone, Copy)]
enum WebhookVerifyMode {
    /// Accept any signature.
    #[default]
    AcceptAll,

    /// Always fail signature verification.
    AlwaysFail,

    /// Behave as if no webhook secret were configured.
    SecretMissing,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    /// Create a mock that has no webhook secret configured.
    pub fn without_webhook_secret() -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::SecretMissing;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_customer(&self, customer: Customer) {
        self.state().customers.insert(customer.id.clone(), customer);
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    pub fn add_checkout_session(&self, session: CheckoutSession) {
        self.state()
            .checkout_sessions
            .insert(session.id.clone(), session);
    }

    pub fn add_payment_method(&self, method: PaymentMethod) {
        self.state()
            .payment_methods
            .insert(method.id.clone(), method);
    }

    /// Set the webhook event to return on verification.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.state().next_webhook_event = Some(event);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    /// Payment intent requests received so far.
    pub fn payment_intent_requests(&self) -> Vec<CreatePaymentIntentParams> {
        self.state().payment_intents.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        // Method-specific errors persist
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Global error is consumed
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    /// Records the call and applies injected errors.
    fn enter(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        self.record_call(method, args);
        self.check_error(method)
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.id_counter += 1;
        format!("{}_mock_{}", prefix, state.id_counter)
    }

    fn update_subscription_with(
        &self,
        subscription_id: &str,
        apply: impl FnOnce(&mut Subscription),
    ) -> Result<Subscription, PaymentError> {
        let mut state = self.state();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| PaymentError::not_found("Subscription"))?;
        apply(subscription);
        Ok(subscription.clone())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        params: CreateCheckoutSessionParams,
    ) -> Result<CheckoutSessionSummary, PaymentError> {
        self.enter(
            "create_checkout_session",
            vec![params.mode.as_str().to_string(), params.success_url.clone()],
        )?;

        let id = self.next_id("cs");
        let url = format!("https://checkout.stripe.com/c/pay/{}", id);
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(url.clone()),
            status: Some("open".to_string()),
            mode: Some(params.mode.as_str().to_string()),
            payment_status: Some("unpaid".to_string()),
            customer: params.customer_id,
            customer_email: params.customer_email,
            subscription: None,
            payment_intent: None,
            amount_total: Some(
                params
                    .line_items
                    .iter()
                    .filter_map(|i| i.price_data.as_ref().map(|p| p.unit_amount * i64::from(i.quantity)))
                    .sum(),
            ),
            currency: params.line_items.iter().find_map(|i| i.price_data.as_ref().map(|p| p.currency.clone())),
            metadata: params.metadata,
            expires_at: Some(Utc::now().timestamp() + 24 * 60 * 60),
        };
        self.add_checkout_session(session);

        Ok(CheckoutSessionSummary {
            id,
            url: Some(url),
            status: "open".to_string(),
        })
    }

    async fn get_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        self.enter("get_checkout_session", vec![session_id.to_string()])?;
        self.state()
            .checkout_sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Checkout session"))
    }

    async fn expire_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        self.enter("expire_checkout_session", vec![session_id.to_string()])?;
        let mut state = self.state();
        let session = state
            .checkout_sessions
            .get_mut(session_id)
            .ok_or_else(|| PaymentError::not_found("Checkout session"))?;
        if session.status.as_deref() != Some("open") {
            return Err(PaymentError::invalid_request(
                "Only open checkout sessions can be expired",
            ));
        }
        session.status = Some("expired".to_string());
        session.url = None;
        Ok(session.clone())
    }

    async fn create_customer(&self, params: CreateCustomerParams) -> Result<Customer, PaymentError> {
        self.enter("create_customer", vec![params.email.clone()])?;

        let customer = Customer {
            id: self.next_id("cus"),
            email: Some(params.email),
            name: params.name,
            phone: params.phone,
            description: params.description,
            metadata: params.metadata,
            default_payment_method: None,
            created: Utc::now().timestamp(),
        };
        self.add_customer(customer.clone());

        if let Some(pm_id) = params.payment_method {
            if let Some(method) = self.state().payment_methods.get_mut(&pm_id) {
                method.customer = Some(customer.id.clone());
            }
        }

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Customer, PaymentError> {
        self.enter("get_customer", vec![customer_id.to_string()])?;
        self.state()
            .customers
            .get(customer_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Customer"))
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        params: UpdateCustomerParams,
    ) -> Result<Customer, PaymentError> {
        self.enter("update_customer", vec![customer_id.to_string()])?;
        let mut state = self.state();
        let customer = state
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| PaymentError::not_found("Customer"))?;

        if let Some(email) = params.email {
            customer.email = Some(email);
        }
        if let Some(name) = params.name {
            customer.name = Some(name);
        }
        if let Some(phone) = params.phone {
            customer.phone = Some(phone);
        }
        if let Some(description) = params.description {
            customer.description = Some(description);
        }
        if let Some(metadata) = params.metadata {
            customer.metadata.extend(metadata);
        }
        if let Some(pm) = params.default_payment_method {
            customer.default_payment_method = Some(pm);
        }
        Ok(customer.clone())
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError> {
        self.enter("delete_customer", vec![customer_id.to_string()])?;
        let mut state = self.state();
        state
            .customers
            .remove(customer_id)
            .ok_or_else(|| PaymentError::not_found("Customer"))?;
        state.deleted_customers.push(customer_id.to_string());
        Ok(())
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        kind: PaymentMethodKind,
    ) -> Result<Vec<PaymentMethod>, PaymentError> {
        self.enter(
            "list_payment_methods",
            vec![customer_id.to_string(), kind.as_str().to_string()],
        )?;
        let mut methods: Vec<PaymentMethod> = self
            .state()
            .payment_methods
            .values()
            .filter(|m| m.customer.as_deref() == Some(customer_id) && m.kind == kind.as_str())
            .cloned()
            .collect();
        methods.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(methods)
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.enter(
            "attach_payment_method",
            vec![payment_method_id.to_string(), customer_id.to_string()],
        )?;
        let mut state = self.state();
        if !state.customers.contains_key(customer_id) {
            return Err(PaymentError::not_found("Customer"));
        }
        let method = state
            .payment_methods
            .entry(payment_method_id.to_string())
            .or_insert_with(|| PaymentMethod {
                id: payment_method_id.to_string(),
                kind: PaymentMethodKind::Card.as_str().to_string(),
                customer: None,
                card: Some(CardDetails {
                    brand: "visa".to_string(),
                    last4: "4242".to_string(),
                    exp_month: 12,
                    exp_year: 2034,
                }),
                created: Utc::now().timestamp(),
            });
        method.customer = Some(customer_id.to_string());
        Ok(method.clone())
    }

    async fn detach_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.enter("detach_payment_method", vec![payment_method_id.to_string()])?;
        let mut state = self.state();
        let method = state
            .payment_methods
            .get_mut(payment_method_id)
            .ok_or_else(|| PaymentError::not_found("Payment method"))?;
        method.customer = None;
        Ok(method.clone())
    }

    async fn create_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        self.enter(
            "create_subscription",
            vec![params.customer_id.clone(), params.items.len().to_string()],
        )?;

        let now = Utc::now().timestamp();
        let trial_end = params
            .trial_period_days
            .map(|days| now + i64::from(days) * 24 * 60 * 60);
        let id = self.next_id("sub");
        let items = params
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| SubscriptionItem {
                id: format!("si_{}_{}", id, i),
                price: item.price.clone(),
                quantity: item.quantity.unwrap_or(1),
            })
            .collect();

        let subscription = Subscription {
            id: id.clone(),
            customer: params.customer_id,
            status: if trial_end.is_some() {
                SubscriptionStatus::Trialing
            } else {
                SubscriptionStatus::Incomplete
            },
            current_period_start: Some(now),
            current_period_end: Some(now + 30 * 24 * 60 * 60),
            cancel_at_period_end: false,
            canceled_at: None,
            trial_end,
            items,
            metadata: params.metadata,
            client_secret: Some(format!("pi_{}_secret_mock", id)),
        };
        self.add_subscription(subscription.clone());
        Ok(subscription)
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, PaymentError> {
        self.enter("get_subscription", vec![subscription_id.to_string()])?;
        self.state()
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Subscription"))
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        params: UpdateSubscriptionParams,
    ) -> Result<Subscription, PaymentError> {
        self.enter("update_subscription", vec![subscription_id.to_string()])?;
        self.update_subscription_with(subscription_id, |sub| {
            if let Some(items) = params.items {
                for (i, item) in items.into_iter().enumerate() {
                    let quantity = item.quantity.unwrap_or(1);
                    match item.id.as_deref().and_then(|id| sub.items.iter_mut().find(|s| s.id == id)) {
                        Some(existing) => {
                            existing.price = item.price;
                            existing.quantity = quantity;
                        }
                        None => sub.items.push(SubscriptionItem {
                            id: format!("si_{}_new_{}", sub.id, i),
                            price: item.price,
                            quantity,
                        }),
                    }
                }
            }
            if let Some(metadata) = params.metadata {
                sub.metadata.extend(metadata);
            }
            if let Some(flag) = params.cancel_at_period_end {
                sub.cancel_at_period_end = flag;
            }
        })
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediate: bool,
    ) -> Result<Subscription, PaymentError> {
        self.enter(
            "cancel_subscription",
            vec![subscription_id.to_string(), immediate.to_string()],
        )?;
        self.update_subscription_with(subscription_id, |sub| {
            if immediate {
                sub.status = SubscriptionStatus::Canceled;
                sub.canceled_at = Some(Utc::now().timestamp());
            } else {
                sub.cancel_at_period_end = true;
            }
        })
    }

    async fn resume_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, PaymentError> {
        self.enter("resume_subscription", vec![subscription_id.to_string()])?;
        self.update_subscription_with(subscription_id, |sub| {
            sub.cancel_at_period_end = false;
        })
    }

    async fn list_customer_subscriptions(
        &self,
        customer_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> Result<Vec<Subscription>, PaymentError> {
        self.enter(
            "list_customer_subscriptions",
            vec![
                customer_id.to_string(),
                status.map(|s| s.as_str()).unwrap_or("all").to_string(),
            ],
        )?;
        let mut subscriptions: Vec<Subscription> = self
            .state()
            .subscriptions
            .values()
            .filter(|s| s.customer == customer_id)
            .filter(|s| status.map_or(s.status != SubscriptionStatus::Canceled, |st| s.status == st))
            .cloned()
            .collect();
        subscriptions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(subscriptions)
    }

    async fn create_payment_intent(
        &self,
        params: CreatePaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        self.enter(
            "create_payment_intent",
            vec![params.amount.to_string(), params.currency.clone()],
        )?;

        let id = self.next_id("pi");
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id,
            amount: params.amount,
            currency: params.currency.clone(),
            status: "requires_payment_method".to_string(),
        };
        self.state().payment_intents.push(params);
        Ok(intent)
    }

    async fn construct_webhook_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.enter(
            "construct_webhook_event",
            vec![
                String::from_utf8_lossy(payload).chars().take(50).collect(),
                signature.chars().take(20).collect(),
            ],
        )?;

        let state = self.state();
        match state.webhook_verify_mode {
            WebhookVerifyMode::AcceptAll => {}
            WebhookVerifyMode::AlwaysFail => {
                return Err(PaymentError::invalid_webhook("Signature mismatch"));
            }
            WebhookVerifyMode::SecretMissing => {
                return Err(PaymentError::not_configured("Webhook secret"));
            }
        }

        if let Some(event) = &state.next_webhook_event {
            return Ok(event.clone());
        }

        serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid payload: {}", e)))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockPaymentProvider {
    /// Create a mock with one customer holding an active subscription.
    pub fn with_active_subscription(customer_id: &str, subscription_id: &str) -> Self {
        let mock = Self::new();
        mock.add_customer(Customer {
            id: customer_id.to_string(),
            email: Some("test@example.com".to_string()),
            name: None,
            phone: None,
            description: None,
            metadata: Default::default(),
            default_payment_method: None,
            created: Utc::now().timestamp(),
        });
        mock.add_subscription(Subscription {
            id: subscription_id.to_string(),
            customer: customer_id.to_string(),
            status: SubscriptionStatus::Active,
            current_period_start: Some(Utc::now().timestamp()),
            current_period_end: Some(Utc::now().timestamp() + 30 * 24 * 60 * 60),
            cancel_at_period_end: false,
            canceled_at: None,
            trial_end: None,
            items: vec![SubscriptionItem {
                id: format!("si_{}", subscription_id),
                price: "price_monthly".to_string(),
                quantity: 1,
            }],
            metadata: Default::default(),
            client_secret: None,
        });
        mock
    }

    /// Build a checkout completed event for a payment-mode session.
    pub fn checkout_completed_event(session_id: &str, customer_id: &str) -> WebhookEvent {
        WebhookEvent {
            id: format!("evt_{}", session_id),
            event_type: "checkout.session.completed".to_string(),
            created: Utc::now().timestamp(),
            livemode: false,
            api_version: None,
            data: crate::domain::webhook::WebhookEventData {
                object: serde_json::json!({
                    "id": session_id,
                    "object": "checkout.session",
                    "customer": customer_id,
                    "mode": CheckoutMode::Payment.as_str(),
                    "payment_status": "paid",
                }),
                previous_attributes: None,
            },
        }
    }
}
