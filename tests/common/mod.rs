// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use homeeats_api::{
    config::AppConfig,
    db,
    entities::{business, menu_item, order, order_item, stakeholder, subscription},
    events::{self, EventSender},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_integration_test";

/// Helper harness backed by a throwaway SQLite database file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Fresh app with webhook signature verification disabled.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Fresh app that verifies webhook signatures with [`WEBHOOK_SECRET`].
    pub async fn with_webhook_secret() -> Self {
        Self::build(Some(WEBHOOK_SECRET.to_string())).await
    }

    async fn build(webhook_secret: Option<String>) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("homeeats_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1",
            18_080,
            "test",
        );
        cfg.stripe_webhook_secret = webhook_secret;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, Some(event_sender));

        let router = Router::new()
            .merge(homeeats_api::root_routes())
            .nest("/api/v1", homeeats_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router response")
    }

    /// Posts a raw webhook body, optionally with a `Stripe-Signature` header.
    pub async fn post_webhook(&self, body: String, signature: Option<String>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/stripe/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body)).expect("build request"))
            .await
            .expect("router response")
    }

    pub async fn seed_business(&self, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        business::ActiveModel {
            id: Set(id),
            name: Set("Ah Ma's Kitchen".to_string()),
            stakeholder_id: Set(None),
            is_active: Set(active),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed business");
        id
    }

    pub async fn seed_menu_item(
        &self,
        business_id: Uuid,
        name: &str,
        price: Decimal,
        available: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        menu_item::ActiveModel {
            id: Set(id),
            business_id: Set(business_id),
            name: Set(name.to_string()),
            price: Set(price),
            is_available: Set(available),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed menu item");
        id
    }

    /// Inserts an order directly, bypassing checkout, for reconciler tests.
    pub async fn seed_order(
        &self,
        business_id: Uuid,
        payment_status: &str,
        status: &str,
        payment_intent_id: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        order::ActiveModel {
            id: Set(id),
            order_number: Set(format!("ORD{}", &Uuid::new_v4().simple().to_string()[..14])),
            business_id: Set(business_id),
            customer_name: Set("Tan Wei Ling".to_string()),
            customer_phone: Set("+6591234567".to_string()),
            customer_email: Set(None),
            total_amount: Set(Decimal::new(2550, 2)),
            amount_total: Set(None),
            currency: Set("sgd".to_string()),
            status: Set(status.to_string()),
            payment_status: Set(payment_status.to_string()),
            stripe_payment_intent_id: Set(payment_intent_id.map(str::to_string)),
            stripe_checkout_session_id: Set(None),
            notes: Set(None),
            pickup_time: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed order");
        id
    }

    pub async fn seed_stakeholder(&self, status: &str) -> Uuid {
        let id = Uuid::new_v4();
        stakeholder::ActiveModel {
            id: Set(id),
            name: Set("Lim Bee Hoon".to_string()),
            status: Set(status.to_string()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed stakeholder");
        id
    }

    pub async fn fetch_order(&self, id: Uuid) -> order::Model {
        order::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query order")
            .expect("order exists")
    }

    pub async fn fetch_order_items(&self, order_id: Uuid) -> Vec<order_item::Model> {
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.state.db)
            .await
            .expect("query order items")
    }

    pub async fn fetch_subscription(&self, stakeholder_id: Uuid) -> Option<subscription::Model> {
        subscription::Entity::find()
            .filter(subscription::Column::StakeholderId.eq(stakeholder_id))
            .one(&*self.state.db)
            .await
            .expect("query subscription")
    }

    pub async fn fetch_stakeholder(&self, id: Uuid) -> stakeholder::Model {
        stakeholder::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query stakeholder")
            .expect("stakeholder exists")
    }
}

/// Builds a valid `Stripe-Signature` header for the given raw body.
pub fn sign_webhook(body: &str) -> String {
    let timestamp = Utc::now().timestamp().to_string();
    let signature =
        homeeats_api::stripe::signature::compute_signature(&timestamp, body.as_bytes(), WEBHOOK_SECRET);
    format!("t={},v1={}", timestamp, signature)
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
