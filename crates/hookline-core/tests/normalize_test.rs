//! Totality tests for the payload normalizer.
//!
//! The normalizer's contract is that it never fails regardless of malformed
//! or partially-missing payload fields, substituting defaults at every level
//! of nested lookup. These tests drive it with arbitrary JSON and with
//! targeted degenerate payloads.

use chrono::{TimeZone, Utc};
use hookline_core::{normalize, EventKind};
use proptest::prelude::*;
use serde_json::{json, Value};

fn receipt_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Strategy producing arbitrary JSON values a few levels deep.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9/_. -]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,12}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Arbitrary payloads under every event-type header produce a complete
    /// record: no panic, an action tag, a non-empty request id and timestamp.
    #[test]
    fn normalizer_is_total(payload in arb_json(), event_type in prop_oneof![
        Just(None),
        Just(Some("push")),
        Just(Some("pull_request")),
        Just(Some("deployment_status")),
    ]) {
        let event = normalize(&payload, event_type, None, receipt_time());

        prop_assert!(!event.request_id.is_empty());
        prop_assert!(!event.timestamp.is_empty());
        prop_assert!(matches!(event.kind.tag(), "PUSH" | "PULL_REQUEST"));
        prop_assert!(!event.author.is_empty());
    }

    /// Pushes never carry a source branch or a sub-action.
    #[test]
    fn push_invariants_hold(payload in arb_json()) {
        let event = normalize(&payload, Some("push"), Some("d"), receipt_time());

        prop_assert_eq!(&event.kind, &EventKind::Push);
        prop_assert_eq!(event.kind.sub_action(), "");
        prop_assert_eq!(event.from_branch, "");
    }
}

#[test]
fn degenerate_payloads_are_defaulted() {
    let cases = [
        json!(null),
        json!([]),
        json!(""),
        json!(0),
        json!({"pusher": null}),
        json!({"pusher": {"name": null}}),
        json!({"head_commit": []}),
        json!({"pull_request": {"user": 7, "head": null, "base": "x"}}),
    ];

    for payload in &cases {
        for event_type in [Some("push"), Some("pull_request"), Some("ping"), None] {
            let event = normalize(payload, event_type, None, receipt_time());
            assert_eq!(event.author, "Unknown", "payload: {payload}");
            assert!(!event.timestamp.is_empty());
        }
    }
}

#[test]
fn single_segment_ref_is_its_own_branch() {
    let event = normalize(&json!({"ref": "main"}), Some("push"), Some("d"), receipt_time());
    assert_eq!(event.to_branch, "main");
}

#[test]
fn empty_ref_yields_empty_branch() {
    let event = normalize(&json!({"ref": ""}), Some("push"), Some("d"), receipt_time());
    assert_eq!(event.to_branch, "");
}
