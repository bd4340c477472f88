use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// Read-side access to orders for the storefront and the business dashboard.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

/// One page of orders, newest first.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Fetches one order with its line items.
    pub async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<(order::Model, Vec<order_item::Model>)>, ServiceError> {
        let db = &*self.db;

        let Some(order) = OrderEntity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(db)
            .await?;
        Ok(Some((order, items)))
    }

    /// Resolves a customer-facing order number to the order it names.
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<(order::Model, Vec<order_item::Model>)>, ServiceError> {
        let db = &*self.db;

        let Some(order) = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(db)
            .await?;
        Ok(Some((order, items)))
    }

    /// Lists orders, optionally scoped to one business, newest first.
    pub async fn list_orders(
        &self,
        business_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderPage, ServiceError> {
        let db = &*self.db;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(business_id) = business_id {
            query = query.filter(order::Column::BusinessId.eq(business_id));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }
}
