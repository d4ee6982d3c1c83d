//! Payload normalizer mapping provider webhook shapes onto canonical events.
//!
//! The one contract that matters here is totality: whatever the provider
//! sends, however mangled or incomplete, this function returns a complete
//! record with documented defaults and never fails. All nested lookups go
//! through [`str_at`] so the defaulting behavior stays auditable in one
//! place rather than scattered across conditional branches.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{CanonicalEvent, EventKind};

/// Author placeholder when the payload carries no resolvable actor.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Default pull-request sub-action when the payload omits one.
const DEFAULT_PR_ACTION: &str = "OPENED";

/// Normalizes a raw provider payload into a canonical event.
///
/// `event_type` and `delivery_id` come from the `X-GitHub-Event` and
/// `X-GitHub-Delivery` request headers; either may be absent. `received_at`
/// is the receipt time used whenever the payload carries no usable
/// timestamp. Unrecognized event types (including a missing header) are
/// treated as pushes.
pub fn normalize(
    payload: &Value,
    event_type: Option<&str>,
    delivery_id: Option<&str>,
    received_at: DateTime<Utc>,
) -> CanonicalEvent {
    let event_type = event_type.unwrap_or("unknown").to_lowercase();

    let (kind, author, from_branch, to_branch, timestamp) = match event_type.as_str() {
        "push" => (
            EventKind::Push,
            str_at(payload, &["pusher", "name"]).unwrap_or(UNKNOWN_AUTHOR).to_string(),
            String::new(),
            str_at(payload, &["ref"]).map(branch_from_ref).unwrap_or_default().to_string(),
            str_at(payload, &["head_commit", "timestamp"])
                .map_or_else(|| iso8601(received_at), str::to_string),
        ),
        "pull_request" => (
            EventKind::PullRequest {
                sub_action: str_at(payload, &["action"])
                    .map_or_else(|| DEFAULT_PR_ACTION.to_string(), str::to_uppercase),
            },
            str_at(payload, &["pull_request", "user", "login"])
                .unwrap_or(UNKNOWN_AUTHOR)
                .to_string(),
            str_at(payload, &["pull_request", "head", "ref"]).unwrap_or_default().to_string(),
            str_at(payload, &["pull_request", "base", "ref"]).unwrap_or_default().to_string(),
            str_at(payload, &["pull_request", "created_at"])
                .map_or_else(|| iso8601(received_at), str::to_string),
        ),
        // Unrecognized event types are shaped like a push, with the receipt
        // time as the timestamp.
        _ => (
            EventKind::Push,
            str_at(payload, &["pusher", "name"]).unwrap_or(UNKNOWN_AUTHOR).to_string(),
            String::new(),
            str_at(payload, &["ref"]).map(branch_from_ref).unwrap_or_default().to_string(),
            iso8601(received_at),
        ),
    };

    let request_id = match delivery_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    CanonicalEvent { request_id, author, kind, from_branch, to_branch, timestamp }
}

/// Walks a path of object keys and returns the string at the end, if any.
///
/// Returns `None` when any intermediate value is missing, not an object, or
/// the final value is not a string. This is the single point where the
/// total-defaulting contract is enforced for nested lookups.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

/// Extracts the branch name from a git ref: `refs/heads/main` -> `main`.
fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

/// Formats a receipt time as an ISO-8601 string with a `Z` suffix.
fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
