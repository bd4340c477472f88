//! Payment-provider boundary: webhook signature verification and the
//! minimal event envelope shapes the reconciler reads.

pub mod event;
pub mod signature;

pub use event::{CheckoutSession, Event, Invoice, PaymentIntent, Refund, SubscriptionObject};
pub use signature::verify_signature;
