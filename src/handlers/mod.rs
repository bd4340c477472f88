use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        checkout::CheckoutService, orders::OrderService, payments::PaymentReconciler,
        subscriptions::SubscriptionService,
    },
};
use std::sync::Arc;

pub mod checkout;
pub mod health;
pub mod orders;
pub mod payment_webhooks;

/// All domain services, wired once at startup and shared through state.
#[derive(Clone)]
pub struct AppServices {
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub reconciler: PaymentReconciler,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig, event_sender: Option<Arc<EventSender>>) -> Self {
        let subscriptions = Arc::new(SubscriptionService::new(db.clone(), event_sender.clone()));
        Self {
            checkout: CheckoutService::new(
                db.clone(),
                event_sender.clone(),
                config.site_url.clone(),
                config.currency.clone(),
            ),
            orders: OrderService::new(db.clone()),
            reconciler: PaymentReconciler::new(db, subscriptions, event_sender),
        }
    }
}
