//! HTTP DTOs for the storefront checkout endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::cart::LineItem;

/// Body of `POST /api/create-payment-intent`, as the storefront script sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub billing_details: Option<BillingDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    /// Charged amount in minor units.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stripe_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_accepts_storefront_cart_layout() {
        let req: CreatePaymentIntentRequest = serde_json::from_value(json!({
            "items": [
                { "id": 1, "name": "Diamond Ring", "price": 89.99, "quantity": 1 },
                { "id": 4, "name": "Pearl Studs", "price": "45.50" }
            ],
            "billingDetails": { "name": "Ada", "email": "ada@shop.test" }
        }))
        .unwrap();

        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items[1].quantity, 1);
        assert_eq!(
            req.billing_details.and_then(|b| b.email).as_deref(),
            Some("ada@shop.test")
        );
    }

    #[test]
    fn missing_items_default_to_empty() {
        let req: CreatePaymentIntentRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.items.is_empty());
        assert!(req.billing_details.is_none());
    }

    #[test]
    fn response_uses_client_field_names() {
        let body = serde_json::to_value(PaymentIntentResponse {
            client_secret: "pi_1_secret".to_string(),
            amount: 19099,
        })
        .unwrap();
        assert_eq!(body, json!({ "clientSecret": "pi_1_secret", "amount": 19099 }));
    }
}
