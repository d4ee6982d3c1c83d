//! Polling endpoint returning the most recent events for the UI.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use hookline_core::StoredEvent;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ApiError;
use crate::server::AppState;

/// Response from the polling endpoint.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Always "success".
    pub status: String,
    /// Number of events in this page.
    pub count: usize,
    /// Events, newest first.
    pub events: Vec<EventView>,
}

/// JSON rendering of one stored event.
///
/// The closed event kind is flattened back into the `action`/`pr_action`
/// string pair the UI consumes, and the identifier is rendered as a string.
#[derive(Debug, Serialize)]
pub struct EventView {
    /// Store-assigned identifier, rendered as a string.
    pub id: String,
    /// Provider delivery identifier (or generated fallback).
    pub request_id: String,
    /// Actor display name or login.
    pub author: String,
    /// "PUSH" or "PULL_REQUEST".
    pub action: String,
    /// Source branch; empty for pushes.
    pub from_branch: String,
    /// Target branch.
    pub to_branch: String,
    /// Pull-request sub-action; empty for pushes.
    pub pr_action: String,
    /// Provider-supplied event time (display only).
    pub timestamp: String,
    /// Store-assigned persistence time (the sort key).
    pub created_at: DateTime<Utc>,
}

impl From<StoredEvent> for EventView {
    fn from(stored: StoredEvent) -> Self {
        Self {
            id: stored.id.to_string(),
            action: stored.event.kind.tag().to_string(),
            pr_action: stored.event.kind.sub_action().to_string(),
            request_id: stored.event.request_id,
            author: stored.event.author,
            from_branch: stored.event.from_branch,
            to_branch: stored.event.to_branch,
            timestamp: stored.event.timestamp,
            created_at: stored.created_at,
        }
    }
}

/// Returns the most recently stored events, newest first.
///
/// Every poll is a fresh bounded query; there is no caching in front of the
/// store. An empty store yields `count: 0` with an empty list.
///
/// # Errors
///
/// Returns 500 with a `status: "failed"` marker when the store query fails.
#[instrument(name = "list_events", skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Response, ApiError> {
    let events = state.store.list_recent(state.poll_limit).await?;

    debug!(count = events.len(), "Serving polled events");

    let events: Vec<EventView> = events.into_iter().map(EventView::from).collect();

    Ok((
        StatusCode::OK,
        Json(EventsResponse {
            status: "success".to_string(),
            count: events.len(),
            events,
        }),
    )
        .into_response())
}
