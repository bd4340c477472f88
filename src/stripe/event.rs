use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// Provider event envelope: `{id, type, data: {object: ...}}`.
///
/// Only the fields the reconciler reads are modeled; the inner object is
/// kept as raw JSON and decoded per event type.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl Event {
    /// Decodes the inner `data.object` as the given shape.
    pub fn object<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// `checkout.session.completed` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_subscription_mode(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }
}

/// `payment_intent.payment_failed` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
}

/// `refund.created` / `charge.refunded` payloads both carry the owning
/// payment intent, which is the only field reconciliation needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// `invoice.payment_succeeded` / `invoice.payment_failed` payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub subscription: Option<String>,
}

/// `customer.subscription.deleted` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_checkout_session_envelope() {
        let raw = json!({
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "mode": "payment",
                    "payment_intent": "pi_123",
                    "amount_total": 1100,
                    "currency": "sgd",
                    "metadata": {"order_id": "8f9f4a1e-0000-0000-0000-000000000001"}
                }
            }
        });

        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        let session: CheckoutSession = event.object().unwrap();
        assert!(!session.is_subscription_mode());
        assert_eq!(session.amount_total, Some(1100));
        assert_eq!(
            session.metadata.get("order_id").map(String::as_str),
            Some("8f9f4a1e-0000-0000-0000-000000000001")
        );
    }

    #[test]
    fn missing_metadata_defaults_empty() {
        let raw = json!({
            "id": "evt_9",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_2"}}
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        let session: CheckoutSession = event.object().unwrap();
        assert!(session.metadata.is_empty());
        assert!(session.payment_intent.is_none());
    }
}
