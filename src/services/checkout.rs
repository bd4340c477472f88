use crate::{
    db::DbPool,
    entities::business::Entity as BusinessEntity,
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::order::ActiveModel as OrderActiveModel,
    entities::order_item::ActiveModel as OrderItemActiveModel,
    errors::ServiceError,
    events::{Event, EventSender},
    order_state::{OrderStatus, PaymentStatus},
};
use chrono::Utc;
use rand::Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attempts before giving up on order-number collisions.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// One cart line as submitted by the storefront. The client may echo a
/// display name and price, but pricing always comes from the menu catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub business_id: Uuid,
    pub items: Vec<CartLine>,
    pub customer_info: CustomerInfo,
}

/// Checkout-session-like response returned to the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub order_id: Uuid,
    pub order_number: String,
    pub message: String,
    pub total_amount: Decimal,
}

/// Converts a client cart into a durable, server-priced order plus line
/// items. No payment is captured here; the provider drives payment state
/// through the webhook reconciler afterwards.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    site_url: String,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        site_url: String,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            site_url,
            currency,
        }
    }

    #[instrument(skip(self, request), fields(business_id = %request.business_id))]
    pub async fn create_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, ServiceError> {
        self.validate(&request)?;

        let db = &*self.db;

        let business = BusinessEntity::find_by_id(request.business_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Business {} not found",
                    request.business_id
                ))
            })?;
        if !business.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Business {} is not accepting orders",
                request.business_id
            )));
        }

        // Re-price every line against the catalog; the request's price
        // fields are display hints only.
        let priced = self.price_cart(&request).await?;

        let amount_cents: i64 = priced.iter().map(|line| line.subtotal_cents).sum();
        if amount_cents <= 0 {
            return Err(ServiceError::ValidationError(
                "Cart total must be positive".to_string(),
            ));
        }
        let total_amount = Decimal::new(amount_cents, 2);

        let order_id = Uuid::new_v4();
        let order_number = self
            .persist_order(order_id, &request, &priced, total_amount)
            .await?;

        info!(
            order_id = %order_id,
            order_number = %order_number,
            total_amount = %total_amount,
            items = priced.len(),
            "Checkout order created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        Ok(CheckoutResponse {
            session_id: format!("cs_local_{}", Uuid::new_v4().simple()),
            url: format!("{}/orders/success?order={}", self.site_url, order_id),
            order_id,
            order_number,
            message: "Order created, awaiting payment".to_string(),
            total_amount,
        })
    }

    fn validate(&self, request: &CheckoutRequest) -> Result<(), ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "items must not be empty".to_string(),
            ));
        }
        if request.customer_info.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "customerInfo.name is required".to_string(),
            ));
        }
        if request.customer_info.phone.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "customerInfo.phone is required".to_string(),
            ));
        }
        for line in &request.items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for item {} must be positive",
                    line.id
                )));
            }
        }
        Ok(())
    }

    /// Loads catalog rows for every cart line and computes integer-cent
    /// subtotals, rejecting unknown, foreign, or unavailable items.
    async fn price_cart(&self, request: &CheckoutRequest) -> Result<Vec<PricedLine>, ServiceError> {
        let db = &*self.db;
        let ids: Vec<Uuid> = request.items.iter().map(|line| line.id).collect();

        let catalog: HashMap<Uuid, menu_item::Model> = MenuItemEntity::find()
            .filter(menu_item::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut priced = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let item = catalog.get(&line.id).ok_or_else(|| {
                ServiceError::ValidationError(format!("Menu item {} is invalid", line.id))
            })?;
            if item.business_id != request.business_id {
                return Err(ServiceError::ValidationError(format!(
                    "Menu item {} does not belong to business {}",
                    line.id, request.business_id
                )));
            }
            if !item.is_available {
                return Err(ServiceError::ValidationError(format!(
                    "Menu item {} is unavailable",
                    item.name
                )));
            }

            let unit_cents = (item.price * Decimal::ONE_HUNDRED)
                .round()
                .to_i64()
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Menu item {} has an unrepresentable price",
                        item.id
                    ))
                })?;
            let subtotal_cents = unit_cents * i64::from(line.quantity);

            priced.push(PricedLine {
                menu_item_id: item.id,
                item_name: item.name.clone(),
                unit_price: item.price,
                quantity: line.quantity,
                subtotal_cents,
                special_instructions: line.notes.clone(),
            });
        }
        Ok(priced)
    }

    /// Inserts the order and all line items in one transaction, retrying
    /// with a fresh order number on a uniqueness conflict.
    async fn persist_order(
        &self,
        order_id: Uuid,
        request: &CheckoutRequest,
        priced: &[PricedLine],
        total_amount: Decimal,
    ) -> Result<String, ServiceError> {
        let db = &*self.db;

        let mut last_err: Option<DbErr> = None;
        for attempt in 0..ORDER_NUMBER_ATTEMPTS {
            let order_number = generate_order_number();
            let now = Utc::now();

            let txn = db.begin().await.map_err(|e| {
                error!(error = %e, "Failed to start checkout transaction");
                ServiceError::DatabaseError(e)
            })?;

            let order = OrderActiveModel {
                id: Set(order_id),
                order_number: Set(order_number.clone()),
                business_id: Set(request.business_id),
                customer_name: Set(request.customer_info.name.clone()),
                customer_phone: Set(request.customer_info.phone.clone()),
                customer_email: Set(request.customer_info.email.clone()),
                total_amount: Set(total_amount),
                amount_total: Set(None),
                currency: Set(self.currency.clone()),
                status: Set(OrderStatus::Pending.to_string()),
                payment_status: Set(PaymentStatus::Pending.to_string()),
                stripe_payment_intent_id: Set(None),
                stripe_checkout_session_id: Set(None),
                notes: Set(request.customer_info.notes.clone()),
                pickup_time: Set(request.customer_info.pickup_time.clone()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            };

            match order.insert(&txn).await {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    let _ = txn.rollback().await;
                    warn!(
                        order_number = %order_number,
                        attempt,
                        "Order number collision, retrying"
                    );
                    last_err = Some(e);
                    continue;
                }
                Err(e) => {
                    let _ = txn.rollback().await;
                    error!(error = %e, order_id = %order_id, "Failed to insert order");
                    return Err(ServiceError::DatabaseError(e));
                }
            }

            for line in priced {
                let item = OrderItemActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    menu_item_id: Set(line.menu_item_id),
                    item_name: Set(line.item_name.clone()),
                    item_price: Set(line.unit_price),
                    quantity: Set(line.quantity),
                    subtotal: Set(Decimal::new(line.subtotal_cents, 2)),
                    special_instructions: Set(line.special_instructions.clone()),
                    created_at: Set(now),
                };
                if let Err(e) = item.insert(&txn).await {
                    let _ = txn.rollback().await;
                    error!(error = %e, order_id = %order_id, "Failed to insert order item");
                    return Err(ServiceError::DatabaseError(e));
                }
            }

            txn.commit().await.map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to commit checkout transaction");
                ServiceError::DatabaseError(e)
            })?;

            return Ok(order_number);
        }

        error!(order_id = %order_id, "Exhausted order number attempts");
        Err(last_err
            .map(ServiceError::DatabaseError)
            .unwrap_or_else(|| {
                ServiceError::InternalError("Could not allocate an order number".to_string())
            }))
    }
}

struct PricedLine {
    menu_item_id: Uuid,
    item_name: String,
    unit_price: Decimal,
    quantity: i32,
    subtotal_cents: i64,
    special_instructions: Option<String>,
}

/// `ORD` + millisecond timestamp tail + random digits, max 17 characters.
/// Collision-resistant enough for one marketplace; the insert path still
/// retries on a unique-key conflict.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD{:010}{:04}", millis % 10_000_000_000, suffix)
}

fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("unique") || msg.contains("duplicate")
}
