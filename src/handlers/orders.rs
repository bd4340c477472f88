use crate::{
    entities::{order, order_item},
    errors::{ErrorResponse, ServiceError},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub business_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub item_name: String,
    pub item_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub business_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub total_amount: Decimal,
    pub amount_total: Option<i64>,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub pickup_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    fn from_parts(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            business_id: order.business_id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_email: order.customer_email,
            total_amount: order.total_amount,
            amount_total: order.amount_total,
            currency: order.currency,
            status: order.status,
            payment_status: order.payment_status,
            notes: order.notes,
            pickup_time: order.pickup_time,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    menu_item_id: item.menu_item_id,
                    item_name: item.item_name,
                    item_price: item.item_price,
                    quantity: item.quantity,
                    subtotal: item.subtotal,
                    special_instructions: item.special_instructions,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Lists orders, optionally filtered to one business.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "One page of orders", body = OrderListResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, ServiceError> {
    let page = state
        .services
        .orders
        .list_orders(query.business_id, query.page, query.per_page)
        .await?;
    Ok(Json(OrderListResponse {
        orders: page.orders,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Fetches one order with its items, by UUID or customer-facing order number.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order UUID or order number")),
    responses(
        (status = 200, description = "The order", body = OrderResponse),
        (status = 404, description = "No such order", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let found = match Uuid::parse_str(&id) {
        Ok(uuid) => state.services.orders.get_order(uuid).await?,
        Err(_) => state.services.orders.get_order_by_number(&id).await?,
    };
    let (order, items) =
        found.ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
    Ok(Json(OrderResponse::from_parts(order, items)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
}
