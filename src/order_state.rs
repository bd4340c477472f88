//! Shared order-state contract between checkout intake and the webhook
//! reconciler. Payment status is monotonic: once a terminal state is
//! reached no event may move it backwards.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operational/fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

/// Payment state of an order, driven exclusively by provider events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Whether moving to `to` is a legal forward transition.
    ///
    /// pending → succeeded | failed, succeeded → refunded. `failed` and
    /// `refunded` are terminal; in particular a failed payment cannot be
    /// resurrected to succeeded without a fresh checkout.
    pub fn can_transition(self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (PaymentStatus::Pending, PaymentStatus::Succeeded)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Succeeded, PaymentStatus::Refunded)
        )
    }

    /// The fulfillment status driven in lockstep with a payment transition.
    pub fn fulfillment_status(self) -> OrderStatus {
        match self {
            PaymentStatus::Pending => OrderStatus::Pending,
            PaymentStatus::Succeeded => OrderStatus::Confirmed,
            PaymentStatus::Failed | PaymentStatus::Refunded => OrderStatus::Cancelled,
        }
    }
}

/// Parse a persisted payment status, treating unknown strings as pending.
/// Rows written before the payment_status column existed default this way.
pub fn payment_status_or_pending(raw: &str) -> PaymentStatus {
    raw.parse().unwrap_or(PaymentStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_forward_only() {
        assert!(PaymentStatus::Pending.can_transition(PaymentStatus::Succeeded));
        assert!(PaymentStatus::Pending.can_transition(PaymentStatus::Failed));
        assert!(!PaymentStatus::Pending.can_transition(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Pending.can_transition(PaymentStatus::Pending));
    }

    #[test]
    fn succeeded_only_refundable() {
        assert!(PaymentStatus::Succeeded.can_transition(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Succeeded.can_transition(PaymentStatus::Pending));
        assert!(!PaymentStatus::Succeeded.can_transition(PaymentStatus::Failed));
        assert!(!PaymentStatus::Succeeded.can_transition(PaymentStatus::Succeeded));
    }

    #[test]
    fn failed_and_refunded_are_terminal() {
        for to in [
            PaymentStatus::Pending,
            PaymentStatus::Succeeded,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert!(!PaymentStatus::Failed.can_transition(to));
            assert!(!PaymentStatus::Refunded.can_transition(to));
        }
    }

    #[test]
    fn fulfillment_follows_payment() {
        assert_eq!(
            PaymentStatus::Succeeded.fulfillment_status(),
            OrderStatus::Confirmed
        );
        assert_eq!(
            PaymentStatus::Failed.fulfillment_status(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            PaymentStatus::Refunded.fulfillment_status(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn string_round_trip() {
        assert_eq!(PaymentStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(
            "refunded".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::Refunded
        );
        assert_eq!(OrderStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(payment_status_or_pending("bogus"), PaymentStatus::Pending);
    }
}
