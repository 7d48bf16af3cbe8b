//! Minimal typed views over the provider's webhook objects. Webhook payloads
//! carry related objects as unexpanded string ids, so these are flat structs
//! deserialized from `data.object`. Unknown fields are ignored.

use {serde::Deserialize, std::collections::HashMap};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// "payment" (one-time) or "subscription" (recurring).
    #[serde(default)]
    pub mode: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub subscription: Option<String>,
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl CheckoutSession {
    /// `customer_details.email` is filled in for every completed session;
    /// `customer_email` only when set at session creation. Prefer the former.
    pub fn payer_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }

    pub fn payer_name(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|d| d.name.as_deref())
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub current_period_end: Option<i64>,
    pub pause_collection: Option<serde_json::Value>,
}

impl SubscriptionObject {
    pub fn is_paused(&self) -> bool {
        self.status == "paused"
            || self
                .pause_collection
                .as_ref()
                .is_some_and(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    pub subscription: Option<String>,
    pub billing_reason: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub created: i64,
}

impl InvoiceObject {
    /// The invoice raised when a subscription is first created — that revenue
    /// is booked by the checkout-completed path, not here.
    pub fn is_subscription_create(&self) -> bool {
        self.billing_reason.as_deref() == Some("subscription_create")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_prefers_customer_details_email() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "mode": "payment",
            "customer_email": "creation@x.com",
            "customer_details": {"email": "completed@x.com", "name": "A"},
        }))
        .unwrap();
        assert_eq!(session.payer_email(), Some("completed@x.com"));
    }

    #[test]
    fn session_tolerates_missing_optionals() {
        let session: CheckoutSession =
            serde_json::from_value(serde_json::json!({"id": "cs_2"})).unwrap();
        assert_eq!(session.payer_email(), None);
        assert!(session.metadata.is_empty());
        assert_eq!(session.metadata_value("bestie_id"), None);
    }

    #[test]
    fn empty_metadata_value_is_none() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_3",
            "metadata": {"bestie_id": ""},
        }))
        .unwrap();
        assert_eq!(session.metadata_value("bestie_id"), None);
    }

    #[test]
    fn pause_collection_null_is_not_paused() {
        let sub: SubscriptionObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "status": "active",
            "pause_collection": null,
        }))
        .unwrap();
        assert!(!sub.is_paused());
    }

    #[test]
    fn invoice_subscription_create_detected() {
        let inv: InvoiceObject = serde_json::from_value(serde_json::json!({
            "id": "in_1",
            "billing_reason": "subscription_create",
        }))
        .unwrap();
        assert!(inv.is_subscription_create());
    }
}
