//! Webhook receiver handler: normalize the provider payload and persist it.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use hookline_core::normalize;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::ApiError;
use crate::server::AppState;

/// Response from successful webhook ingestion.
#[derive(Debug, Serialize)]
pub struct ReceiveResponse {
    /// Always "success".
    pub status: String,
    /// Store-assigned identifier for the persisted event.
    pub id: String,
    /// Human-readable confirmation.
    pub message: String,
}

/// Ingests a provider webhook.
///
/// Decodes the JSON body, normalizes it into a canonical event using the
/// `X-GitHub-Event` and `X-GitHub-Delivery` headers, and persists it. The
/// response echoes the store-assigned identifier.
///
/// # Errors
///
/// - 400 when the body is absent, unparseable, or JSON `null`
/// - 500 when the store is unreachable or rejects the write
#[instrument(
    name = "receive_webhook",
    skip(state, headers, body),
    fields(
        event_type = headers.get("x-github-event").and_then(|v| v.to_str().ok()).unwrap_or("unknown"),
        delivery_id = headers.get("x-github-delivery").and_then(|v| v.to_str().ok()).unwrap_or("none"),
        payload_size = body.len(),
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        warn!("Rejected webhook with empty body");
        return Err(ApiError::Validation("No payload received".to_string()));
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected webhook with unparseable body");
        ApiError::Validation(format!("Invalid JSON payload: {e}"))
    })?;

    // A body of literal `null` decodes fine but carries no payload.
    if payload.is_null() {
        return Err(ApiError::Validation("No payload received".to_string()));
    }

    let event_type = header_str(&headers, "x-github-event");
    let delivery_id = header_str(&headers, "x-github-delivery");

    let event = normalize(&payload, event_type, delivery_id, state.clock.now_utc());
    let id = state.store.record(event).await?;

    info!(event_id = %id, "Webhook received and stored");

    Ok((
        StatusCode::OK,
        Json(ReceiveResponse {
            status: "success".to_string(),
            id: id.to_string(),
            message: "Webhook received and stored".to_string(),
        }),
    )
        .into_response())
}

/// Extracts a header value as a string, ignoring non-UTF-8 values.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
