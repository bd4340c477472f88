use crate::{
    errors::{ErrorResponse, ServiceError},
    stripe::{self, verify_signature},
    AppState,
};
use axum::{
    extract::State, http::HeaderMap, response::IntoResponse, routing::post, Json, Router,
};
use bytes::Bytes;
use serde_json::json;
use tracing::warn;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Receives payment-provider webhooks.
///
/// The raw body bytes are verified against the signing secret before any
/// parsing. Once a request is authenticated and well-formed it is always
/// acknowledged with 200, even if applying it fails; the provider retries
/// only transport-level failures.
#[utoipa::path(
    post,
    path = "/api/v1/stripe/webhook",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Invalid signature or payload", body = ErrorResponse)
    ),
    tag = "webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !verify_signature(header, &body, secret, state.config.webhook_tolerance_secs()) {
            warn!("Webhook signature verification failed");
            return Err(ServiceError::BadRequest("Invalid signature".to_string()));
        }
    } else {
        warn!("No webhook secret configured; accepting unverified event");
    }

    let event: stripe::Event = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid event payload: {}", e)))?;

    state.services.reconciler.process(&event).await;

    Ok(Json(json!({ "received": true })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(stripe_webhook))
}
