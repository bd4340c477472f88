use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    order_state::{payment_status_or_pending, PaymentStatus},
    services::subscriptions::SubscriptionService,
    stripe,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Result of applying one provider event to local state. Every variant is a
/// successful handling from the provider's point of view; only transport and
/// datastore failures surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The event moved local state forward.
    Applied,
    /// A duplicate delivery; local state already reflects the event.
    AlreadyApplied,
    /// The event is irrelevant or missing required metadata.
    Ignored,
    /// The event was blocked by the monotonic state machine.
    Superseded,
    /// No local row matched the event's natural key.
    NotFound,
}

/// Applies asynchronous payment-provider notifications to orders and
/// subscriptions: at-most-once, monotonic, tolerant of duplicates and
/// out-of-order delivery.
#[derive(Clone)]
pub struct PaymentReconciler {
    db: Arc<DbPool>,
    subscriptions: Arc<SubscriptionService>,
    event_sender: Option<Arc<EventSender>>,
}

impl PaymentReconciler {
    pub fn new(
        db: Arc<DbPool>,
        subscriptions: Arc<SubscriptionService>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            subscriptions,
            event_sender,
        }
    }

    /// Dispatches one authenticated event. Persistence failures are logged
    /// with full context and absorbed so the provider is not driven into a
    /// redelivery storm; operators monitor the logs for missed events.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn process(&self, event: &stripe::Event) {
        let started = Instant::now();

        let result = match event.event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(event).await,
            "payment_intent.payment_failed" => self.handle_payment_failed(event).await,
            "charge.refunded" | "refund.created" => self.handle_refund(event).await,
            "invoice.payment_succeeded" => self.handle_invoice(event, "active").await,
            "invoice.payment_failed" => self.handle_invoice(event, "past_due").await,
            "customer.subscription.deleted" => self.handle_subscription_deleted(event).await,
            other => {
                info!(event_type = other, "Unhandled event type");
                Ok(ReconcileOutcome::Ignored)
            }
        };

        let elapsed_ms = started.elapsed().as_millis();
        match result {
            Ok(outcome) => {
                info!(?outcome, elapsed_ms, "Webhook event processed");
            }
            Err(e) => {
                // Log-and-absorb: acknowledged to the provider regardless.
                error!(error = %e, elapsed_ms, "Webhook event failed to apply");
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &stripe::Event,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let session: stripe::CheckoutSession = match event.object() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Malformed checkout session payload, ignoring");
                return Ok(ReconcileOutcome::Ignored);
            }
        };

        if session.is_subscription_mode() {
            return self.apply_subscription_checkout(&session).await;
        }
        self.apply_order_payment_success(&session).await
    }

    /// One-time payment success: check-then-skip on current payment status,
    /// then a conditional update scoped to `pending` so concurrent replays
    /// collapse to a single application.
    pub async fn apply_order_payment_success(
        &self,
        session: &stripe::CheckoutSession,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let db = &*self.db;

        let Some(raw_order_id) = session.metadata.get("order_id") else {
            info!(session_id = %session.id, "No order_id metadata, ignoring session");
            return Ok(ReconcileOutcome::Ignored);
        };
        let Ok(order_id) = Uuid::parse_str(raw_order_id) else {
            warn!(session_id = %session.id, order_id = %raw_order_id, "Unparseable order_id metadata");
            return Ok(ReconcileOutcome::Ignored);
        };

        let Some(existing) = OrderEntity::find_by_id(order_id).one(db).await? else {
            warn!(order_id = %order_id, "No order found for completed session");
            return Ok(ReconcileOutcome::NotFound);
        };

        let current = payment_status_or_pending(&existing.payment_status);
        if current == PaymentStatus::Succeeded {
            info!(order_id = %order_id, "Payment already succeeded, skipping");
            return Ok(ReconcileOutcome::AlreadyApplied);
        }
        if !current.can_transition(PaymentStatus::Succeeded) {
            warn!(
                order_id = %order_id,
                payment_status = %current,
                "Refusing to mark a finalized order as succeeded"
            );
            return Ok(ReconcileOutcome::Superseded);
        }

        let mut update = OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Succeeded.to_string()),
            )
            .col_expr(
                order::Column::Status,
                Expr::value(PaymentStatus::Succeeded.fulfillment_status().to_string()),
            )
            .col_expr(
                order::Column::StripePaymentIntentId,
                Expr::value(session.payment_intent.clone()),
            )
            .col_expr(
                order::Column::StripeCheckoutSessionId,
                Expr::value(Some(session.id.clone())),
            )
            .col_expr(
                order::Column::AmountTotal,
                Expr::value(session.amount_total),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(Utc::now())));
        if let Some(currency) = &session.currency {
            update = update.col_expr(order::Column::Currency, Expr::value(currency.clone()));
        }

        let result = update
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Pending.to_string()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            // A concurrent delivery won the race with equivalent data.
            info!(order_id = %order_id, "Success transition already applied concurrently");
            return Ok(ReconcileOutcome::AlreadyApplied);
        }

        info!(
            order_id = %order_id,
            rows = result.rows_affected,
            amount_total = ?session.amount_total,
            "Order payment succeeded"
        );
        self.emit(Event::PaymentSucceeded(order_id)).await;
        Ok(ReconcileOutcome::Applied)
    }

    async fn apply_subscription_checkout(
        &self,
        session: &stripe::CheckoutSession,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let (Some(raw_stakeholder), Some(plan)) = (
            session.metadata.get("stakeholder_id"),
            session.metadata.get("plan"),
        ) else {
            warn!(session_id = %session.id, "Missing metadata in subscription checkout, ignoring");
            return Ok(ReconcileOutcome::Ignored);
        };
        let Ok(stakeholder_id) = Uuid::parse_str(raw_stakeholder) else {
            warn!(session_id = %session.id, stakeholder_id = %raw_stakeholder, "Unparseable stakeholder_id metadata");
            return Ok(ReconcileOutcome::Ignored);
        };

        self.subscriptions
            .activate_from_checkout(stakeholder_id, plan, session.subscription.clone())
            .await?;
        Ok(ReconcileOutcome::Applied)
    }

    /// Marks an order failed by its payment intent. Scoped away from the
    /// terminal success states so a stale failure can never claw back a
    /// succeeded or refunded order.
    pub async fn apply_payment_failed(
        &self,
        intent_id: &str,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let db = &*self.db;

        let Some(existing) = OrderEntity::find()
            .filter(order::Column::StripePaymentIntentId.eq(intent_id))
            .one(db)
            .await?
        else {
            warn!(payment_intent_id = %intent_id, "No order found for failed payment");
            return Ok(ReconcileOutcome::NotFound);
        };

        let result = OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Failed.to_string()),
            )
            .col_expr(
                order::Column::Status,
                Expr::value(PaymentStatus::Failed.fulfillment_status().to_string()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(order::Column::Id.eq(existing.id))
            .filter(order::Column::PaymentStatus.is_not_in([
                PaymentStatus::Succeeded.to_string(),
                PaymentStatus::Refunded.to_string(),
            ]))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            warn!(
                order_id = %existing.id,
                payment_intent_id = %intent_id,
                "Failure event superseded by a finalized payment state"
            );
            return Ok(ReconcileOutcome::Superseded);
        }

        info!(
            order_id = %existing.id,
            payment_intent_id = %intent_id,
            rows = result.rows_affected,
            "Order payment failed"
        );
        self.emit(Event::PaymentFailed(existing.id)).await;
        Ok(ReconcileOutcome::Applied)
    }

    /// Applies a refund by payment intent: only a succeeded order can move
    /// to refunded; re-delivery of the refund is a no-op rewrite.
    pub async fn apply_refund(&self, intent_id: &str) -> Result<ReconcileOutcome, ServiceError> {
        let db = &*self.db;

        let Some(existing) = OrderEntity::find()
            .filter(order::Column::StripePaymentIntentId.eq(intent_id))
            .one(db)
            .await?
        else {
            warn!(payment_intent_id = %intent_id, "No order found for refund");
            return Ok(ReconcileOutcome::NotFound);
        };

        let already_refunded =
            payment_status_or_pending(&existing.payment_status) == PaymentStatus::Refunded;

        let result = OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Refunded.to_string()),
            )
            .col_expr(
                order::Column::Status,
                Expr::value(PaymentStatus::Refunded.fulfillment_status().to_string()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(order::Column::Id.eq(existing.id))
            .filter(order::Column::PaymentStatus.is_in([
                PaymentStatus::Succeeded.to_string(),
                PaymentStatus::Refunded.to_string(),
            ]))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            warn!(
                order_id = %existing.id,
                payment_intent_id = %intent_id,
                payment_status = %existing.payment_status,
                "Refund event for an order that never succeeded"
            );
            return Ok(ReconcileOutcome::Superseded);
        }

        if already_refunded {
            info!(order_id = %existing.id, "Order already refunded, rewrite was a no-op");
            return Ok(ReconcileOutcome::AlreadyApplied);
        }

        info!(
            order_id = %existing.id,
            payment_intent_id = %intent_id,
            rows = result.rows_affected,
            "Order refunded"
        );
        self.emit(Event::PaymentRefunded(existing.id)).await;
        Ok(ReconcileOutcome::Applied)
    }

    async fn handle_payment_failed(
        &self,
        event: &stripe::Event,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let intent: stripe::PaymentIntent = match event.object() {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "Malformed payment intent payload, ignoring");
                return Ok(ReconcileOutcome::Ignored);
            }
        };
        self.apply_payment_failed(&intent.id).await
    }

    async fn handle_refund(&self, event: &stripe::Event) -> Result<ReconcileOutcome, ServiceError> {
        let refund: stripe::Refund = match event.object() {
            Ok(refund) => refund,
            Err(e) => {
                warn!(error = %e, "Malformed refund payload, ignoring");
                return Ok(ReconcileOutcome::Ignored);
            }
        };
        let Some(intent_id) = refund.payment_intent.as_deref() else {
            info!("Refund event without payment intent, ignoring");
            return Ok(ReconcileOutcome::Ignored);
        };
        self.apply_refund(intent_id).await
    }

    async fn handle_invoice(
        &self,
        event: &stripe::Event,
        status: &str,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let invoice: stripe::Invoice = match event.object() {
            Ok(invoice) => invoice,
            Err(e) => {
                warn!(error = %e, "Malformed invoice payload, ignoring");
                return Ok(ReconcileOutcome::Ignored);
            }
        };
        let Some(provider_id) = invoice.subscription.as_deref() else {
            info!("Invoice without subscription, ignoring");
            return Ok(ReconcileOutcome::Ignored);
        };

        let rows = self
            .subscriptions
            .update_status_by_provider_id(provider_id, status)
            .await?;
        Ok(if rows == 0 {
            ReconcileOutcome::NotFound
        } else {
            ReconcileOutcome::Applied
        })
    }

    async fn handle_subscription_deleted(
        &self,
        event: &stripe::Event,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let subscription: stripe::SubscriptionObject = match event.object() {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Malformed subscription payload, ignoring");
                return Ok(ReconcileOutcome::Ignored);
            }
        };

        let rows = self
            .subscriptions
            .update_status_by_provider_id(&subscription.id, "canceled")
            .await?;
        Ok(if rows == 0 {
            ReconcileOutcome::NotFound
        } else {
            ReconcileOutcome::Applied
        })
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send payment event");
            }
        }
    }
}
