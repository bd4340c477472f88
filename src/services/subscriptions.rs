use crate::{
    db::DbPool,
    entities::stakeholder::{self, Entity as StakeholderEntity},
    entities::subscription::{
        self, ActiveModel as SubscriptionActiveModel, Entity as SubscriptionEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Maintains the one-per-stakeholder subscription row and cascades billing
/// outcomes onto stakeholder account status.
#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SubscriptionService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Upserts the stakeholder's subscription after a completed subscription
    /// checkout and activates the stakeholder. Keyed on the unique
    /// `stakeholder_id`, so replays rewrite the same row.
    #[instrument(skip(self), fields(stakeholder_id = %stakeholder_id, plan = %plan))]
    pub async fn activate_from_checkout(
        &self,
        stakeholder_id: Uuid,
        plan: &str,
        provider_subscription_id: Option<String>,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let existing = SubscriptionEntity::find()
            .filter(subscription::Column::StakeholderId.eq(stakeholder_id))
            .one(db)
            .await?;

        match existing {
            Some(row) => {
                let mut model: SubscriptionActiveModel = row.into();
                model.plan = Set(plan.to_string());
                model.status = Set("active".to_string());
                model.stripe_subscription_id = Set(provider_subscription_id);
                model.updated_at = Set(Some(now));
                model.update(db).await?;
                info!("Subscription renewed");
            }
            None => {
                let model = SubscriptionActiveModel {
                    id: Set(Uuid::new_v4()),
                    stakeholder_id: Set(stakeholder_id),
                    plan: Set(plan.to_string()),
                    status: Set("active".to_string()),
                    stripe_subscription_id: Set(provider_subscription_id),
                    current_period_end: Set(None),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                };
                model.insert(db).await?;
                info!("Subscription created");
            }
        }

        self.set_stakeholder_status(stakeholder_id, "active").await?;
        self.emit(Event::SubscriptionUpdated(stakeholder_id)).await;
        Ok(())
    }

    /// Updates a subscription's status by the provider's subscription id and
    /// cascades onto the owning stakeholder. Returns the number of matched
    /// subscriptions (0 when the id is unknown).
    #[instrument(skip(self), fields(provider_subscription_id = %provider_id, status = %status))]
    pub async fn update_status_by_provider_id(
        &self,
        provider_id: &str,
        status: &str,
    ) -> Result<u64, ServiceError> {
        let db = &*self.db;

        let Some(row) = SubscriptionEntity::find()
            .filter(subscription::Column::StripeSubscriptionId.eq(provider_id))
            .one(db)
            .await?
        else {
            warn!("No subscription found for provider id");
            return Ok(0);
        };

        let stakeholder_id = row.stakeholder_id;
        let mut model: SubscriptionActiveModel = row.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Some(Utc::now()));
        model.update(db).await?;

        let stakeholder_status = if status == "active" { "active" } else { "inactive" };
        self.set_stakeholder_status(stakeholder_id, stakeholder_status)
            .await?;

        info!(stakeholder_id = %stakeholder_id, "Subscription status updated");
        self.emit(Event::SubscriptionUpdated(stakeholder_id)).await;
        Ok(1)
    }

    async fn set_stakeholder_status(
        &self,
        stakeholder_id: Uuid,
        status: &str,
    ) -> Result<(), ServiceError> {
        let result = StakeholderEntity::update_many()
            .col_expr(stakeholder::Column::Status, Expr::value(status.to_string()))
            .filter(stakeholder::Column::Id.eq(stakeholder_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            warn!(stakeholder_id = %stakeholder_id, "No stakeholder row to cascade onto");
        }
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send subscription event");
            }
        }
    }
}
