//! Canonical event model and strongly-typed identifiers.
//!
//! Defines the normalized record stored for every inbound webhook regardless
//! of source event shape, plus the newtype ID wrapper and the closed event
//! kind variant that replaces the provider's string-typed action fields.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgRow = sqlx::postgres::PgRow;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed event identifier.
///
/// Wraps a UUID to prevent mixing with delivery identifiers. Assigned by the
/// store on insert; events are immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for EventId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for EventId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for EventId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Kind of provider event, as a closed variant.
///
/// The sub-action ("OPENED", "CLOSED", ...) only exists for pull requests;
/// pushes render it as an empty string. Unrecognized event types fall back
/// to `Push` during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Branch push.
    Push,
    /// Pull request activity with its uppercased sub-action.
    PullRequest {
        /// Uppercased payload action, e.g. "OPENED" or "CLOSED".
        sub_action: String,
    },
}

impl EventKind {
    /// Wire/database tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::PullRequest { .. } => "PULL_REQUEST",
        }
    }

    /// Sub-action string; empty unless this is a pull request.
    pub fn sub_action(&self) -> &str {
        match self {
            Self::Push => "",
            Self::PullRequest { sub_action } => sub_action,
        }
    }

    /// Reassembles a kind from its stored tag and sub-action columns.
    ///
    /// Unknown tags decode as `Push`, matching the normalizer's fallback so
    /// a stored row can always be represented.
    pub fn from_columns(tag: &str, sub_action: &str) -> Self {
        match tag {
            "PULL_REQUEST" => Self::PullRequest { sub_action: sub_action.to_string() },
            _ => Self::Push,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The normalized record produced for every inbound webhook.
///
/// Output of the payload normalizer; the store gateway adds the identifier
/// and `created_at` stamp when it persists one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEvent {
    /// Provider-supplied delivery identifier, or a generated UUID when the
    /// header was absent. Not guaranteed unique across provider retries.
    pub request_id: String,

    /// Actor display name or login; "Unknown" when unresolvable.
    pub author: String,

    /// Event kind with its pull-request sub-action when applicable.
    pub kind: EventKind,

    /// Source branch; empty for pushes.
    pub from_branch: String,

    /// Target/ref branch name; empty when the payload carried no ref.
    pub to_branch: String,

    /// ISO-8601 provider event time, falling back to receipt time.
    ///
    /// Untrusted client data; kept for display only. Ordering uses the
    /// store-assigned `created_at` instead.
    pub timestamp: String,
}

/// A canonical event as persisted, with store-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Store-assigned identifier.
    pub id: EventId,

    /// The normalized event fields.
    pub event: CanonicalEvent,

    /// Stamped by the gateway at persistence time; the sort key for polling.
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for StoredEvent {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        let action: String = row.try_get("action")?;
        let pr_action: String = row.try_get("pr_action")?;

        Ok(Self {
            id: row.try_get("id")?,
            event: CanonicalEvent {
                request_id: row.try_get("request_id")?,
                author: row.try_get("author")?,
                kind: EventKind::from_columns(&action, &pr_action),
                from_branch: row.try_get("from_branch")?,
                to_branch: row.try_get("to_branch")?,
                timestamp: row.try_get("event_timestamp")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }
}
