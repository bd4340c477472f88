use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the order/payment core. Consumers are
/// best-effort observers; event delivery never gates a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    PaymentSucceeded(Uuid),
    PaymentFailed(Uuid),
    PaymentRefunded(Uuid),
    SubscriptionUpdated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event for operational auditing.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = %id, "event: order created"),
            Event::PaymentSucceeded(id) => info!(order_id = %id, "event: payment succeeded"),
            Event::PaymentFailed(id) => info!(order_id = %id, "event: payment failed"),
            Event::PaymentRefunded(id) => info!(order_id = %id, "event: payment refunded"),
            Event::SubscriptionUpdated(id) => {
                info!(stakeholder_id = %id, "event: subscription updated")
            }
        }
    }
}
