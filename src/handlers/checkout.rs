use crate::{
    errors::{ErrorResponse, ServiceError},
    services::checkout::{CheckoutRequest, CheckoutResponse},
    AppState,
};
use axum::{extract::State, routing::post, Json, Router};

/// Creates an order from a storefront cart and returns a payment session
/// descriptor. Pricing is recomputed server-side from the menu catalog.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order created, awaiting payment", body = CheckoutResponse),
        (status = 400, description = "Invalid cart or customer info", body = ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ServiceError> {
    let response = state.services.checkout.create_checkout(request).await?;
    Ok(Json(response))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(create_checkout))
}
