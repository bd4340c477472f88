//! Integration tests for the checkout intake flow: cart validation,
//! server-side re-pricing, order persistence, and order lookup.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn checkout_creates_pending_order_with_server_prices() {
    let app = TestApp::new().await;
    let business_id = app.seed_business(true).await;
    let laksa = app
        .seed_menu_item(business_id, "Laksa", dec!(8.50), true)
        .await;
    let kueh = app
        .seed_menu_item(business_id, "Kueh Lapis", dec!(4.25), true)
        .await;

    // The client lies about prices; the server must re-price from the menu.
    let payload = json!({
        "businessId": business_id,
        "items": [
            {"id": laksa, "quantity": 2, "price": "0.01"},
            {"id": kueh, "quantity": 1, "name": "Free Kueh", "price": "0.00"}
        ],
        "customerInfo": {
            "name": "Tan Wei Ling",
            "phone": "+6591234567",
            "email": "weiling@example.com"
        }
    });

    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["totalAmount"], json!("21.25"));
    assert!(body["sessionId"].as_str().unwrap().starts_with("cs_local_"));
    assert!(body["url"].as_str().unwrap().contains("/orders/success?order="));

    let order_number = body["orderNumber"].as_str().unwrap();
    assert!(order_number.starts_with("ORD"));
    assert_eq!(order_number.len(), 17);

    let order_id = Uuid::parse_str(body["orderId"].as_str().unwrap()).unwrap();
    let order = app.fetch_order(order_id).await;
    assert_eq!(order.payment_status, "pending");
    assert_eq!(order.status, "pending");
    assert_eq!(order.total_amount, dec!(21.25));
    assert_eq!(order.currency, "sgd");
    assert!(order.stripe_payment_intent_id.is_none());

    let items = app.fetch_order_items(order_id).await;
    assert_eq!(items.len(), 2);
    let laksa_line = items.iter().find(|i| i.menu_item_id == laksa).unwrap();
    assert_eq!(laksa_line.item_price, dec!(8.50));
    assert_eq!(laksa_line.quantity, 2);
    assert_eq!(laksa_line.subtotal, dec!(17.00));
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_bad_customer_info() {
    let app = TestApp::new().await;
    let business_id = app.seed_business(true).await;
    let item = app
        .seed_menu_item(business_id, "Laksa", dec!(8.50), true)
        .await;

    let empty_cart = json!({
        "businessId": business_id,
        "items": [],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(empty_cart)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let blank_name = json!({
        "businessId": business_id,
        "items": [{"id": item, "quantity": 1}],
        "customerInfo": {"name": "  ", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(blank_name)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let zero_quantity = json!({
        "businessId": business_id,
        "items": [{"id": item, "quantity": 0}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(zero_quantity)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // None of the rejected requests left an order behind.
    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    let body = response_json(response).await;
    assert_eq!(body["total"], json!(0));
}

#[tokio::test]
async fn checkout_rejects_unknown_and_inactive_business() {
    let app = TestApp::new().await;

    let unknown = json!({
        "businessId": Uuid::new_v4(),
        "items": [{"id": Uuid::new_v4(), "quantity": 1}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(unknown)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let inactive_id = app.seed_business(false).await;
    let item = app
        .seed_menu_item(inactive_id, "Laksa", dec!(8.50), true)
        .await;
    let inactive = json!({
        "businessId": inactive_id,
        "items": [{"id": item, "quantity": 1}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(inactive)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_rejects_foreign_and_unavailable_items() {
    let app = TestApp::new().await;
    let business_id = app.seed_business(true).await;
    let other_business = app.seed_business(true).await;

    let foreign_item = app
        .seed_menu_item(other_business, "Nasi Lemak", dec!(6.00), true)
        .await;
    let payload = json!({
        "businessId": business_id,
        "items": [{"id": foreign_item, "quantity": 1}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let sold_out = app
        .seed_menu_item(business_id, "Otah", dec!(2.00), false)
        .await;
    let payload = json!({
        "businessId": business_id,
        "items": [{"id": sold_out, "quantity": 1}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload = json!({
        "businessId": business_id,
        "items": [{"id": Uuid::new_v4(), "quantity": 1}],
        "customerInfo": {"name": "A", "phone": "123"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_retrievable_by_id_and_number() {
    let app = TestApp::new().await;
    let business_id = app.seed_business(true).await;
    let item = app
        .seed_menu_item(business_id, "Laksa", dec!(8.50), true)
        .await;

    let payload = json!({
        "businessId": business_id,
        "items": [{"id": item, "quantity": 1}],
        "customerInfo": {"name": "Tan Wei Ling", "phone": "+6591234567"}
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = response_json(response).await;
    let order_id = created["orderId"].as_str().unwrap().to_string();
    let order_number = created["orderNumber"].as_str().unwrap().to_string();

    let by_id = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(by_id.status(), StatusCode::OK);
    let body = response_json(by_id).await;
    assert_eq!(body["order_number"], json!(order_number));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let by_number = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_number), None)
        .await;
    assert_eq!(by_number.status(), StatusCode::OK);
    let body = response_json(by_number).await;
    assert_eq!(body["id"], json!(order_id));

    let missing = app
        .request(Method::GET, &format!("/api/v1/orders/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_list_filters_by_business() {
    let app = TestApp::new().await;
    let first = app.seed_business(true).await;
    let second = app.seed_business(true).await;
    app.seed_order(first, "pending", "pending", None).await;
    app.seed_order(first, "succeeded", "confirmed", Some("pi_1")).await;
    app.seed_order(second, "pending", "pending", None).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders?business_id={}", first),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);

    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    let body = response_json(response).await;
    assert_eq!(body["total"], json!(3));
}
