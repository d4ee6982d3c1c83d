//! HTTP request handlers for the hookline API.
//!
//! Handlers are grouped by endpoint:
//! - `receive` - webhook ingestion (`POST /webhook/receiver`)
//! - `events` - polling endpoint for the UI (`GET /webhook/events`)
//! - `index` - static UI page with inline fallback
//!
//! All errors are caught at this boundary and rendered as JSON; nothing
//! propagates to the caller as an unhandled fault. Missing or unparseable
//! bodies map to 400, store failures to 500 with a `status: "failed"`
//! marker.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hookline_core::CoreError;
use serde_json::json;
use thiserror::Error;

pub mod events;
pub mod index;
pub mod receive;

pub use events::list_events;
pub use index::index_page;
pub use receive::receive_webhook;

/// Error taxonomy for the request boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unparseable request body (HTTP 400).
    #[error("{0}")]
    Validation(String),

    /// Store unreachable or rejected the operation (HTTP 500).
    #[error(transparent)]
    Persistence(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            },
            Self::Persistence(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string(), "status": "failed" })),
            )
                .into_response(),
        }
    }
}
