//! Error types and result handling for webhook persistence.
//!
//! The service performs at most one store operation per request, so the
//! taxonomy is small: any failure to reach the store or complete a write or
//! query surfaces as a persistence error and is never silently dropped.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store unreachable or the write/query was rejected.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Persistence(format!("store unreachable: {err}"))
            },
            _ => Self::Persistence(err.to_string()),
        }
    }
}
