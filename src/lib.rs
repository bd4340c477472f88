//! Home Eats API Library
//!
//! Checkout intake and payment webhook reconciliation for a home-based
//! food business marketplace.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod order_state;
pub mod services;
pub mod stripe;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use utoipa::OpenApi;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Option<Arc<events::EventSender>>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Option<Arc<events::EventSender>>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config, event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// All v1 API routes, to be nested under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/checkout", handlers::checkout::routes())
        .nest("/orders", handlers::orders::routes())
        .nest("/stripe", handlers::payment_webhooks::routes())
}

/// Root-level routes (liveness, API docs).
pub fn root_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "homeeats-api up" }))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::checkout::create_checkout,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::payment_webhooks::stripe_webhook,
        handlers::health::health_check,
    ),
    components(schemas(
        services::checkout::CartLine,
        services::checkout::CustomerInfo,
        services::checkout::CheckoutRequest,
        services::checkout::CheckoutResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderResponse,
        handlers::orders::OrderListResponse,
        errors::ErrorResponse,
    )),
    tags(
        (name = "checkout", description = "Cart to order intake"),
        (name = "orders", description = "Order lookup"),
        (name = "webhooks", description = "Payment provider notifications"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
