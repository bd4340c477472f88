use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// An order placed against one business. Fulfillment (`status`) and payment
/// (`payment_status`) advance independently; the webhook reconciler is the
/// only writer after intake.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 20,
        message = "Order number must be between 1 and 20 characters"
    ))]
    pub order_number: String,

    pub business_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,

    /// Server-computed cart total in major currency units.
    pub total_amount: Decimal,
    /// Minor-unit amount recorded once payment succeeds, for provider parity.
    pub amount_total: Option<i64>,
    pub currency: String,

    pub status: String,
    pub payment_status: String,

    pub stripe_payment_intent_id: Option<String>,
    pub stripe_checkout_session_id: Option<String>,

    pub notes: Option<String>,
    pub pickup_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id"
    )]
    Business,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
