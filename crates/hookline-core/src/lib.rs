//! Core domain types for the hookline webhook service.
//!
//! Provides the canonical event model, the payload normalizer that maps
//! provider-specific webhook shapes onto it, and the event store gateway
//! used by the HTTP layer for persistence and polling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod normalize;
pub mod store;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{CanonicalEvent, EventId, EventKind, StoredEvent};
pub use normalize::normalize;
pub use store::{EventStore, PostgresEventStore, DEFAULT_POLL_LIMIT};
pub use time::{Clock, RealClock, TestClock};
