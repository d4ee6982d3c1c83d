//! Integration tests for the polling endpoint and the UI page.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use hookline_api::{create_router, AppState};
use hookline_core::{
    store::mock::MemoryEventStore, CanonicalEvent, EventKind, EventStore, TestClock,
};
use serde_json::Value;
use tower::ServiceExt;

fn test_router(store: Arc<MemoryEventStore>) -> Router {
    let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    create_router(AppState::new(store, Arc::new(clock)))
}

fn push_event(branch: &str) -> CanonicalEvent {
    CanonicalEvent {
        request_id: format!("delivery-{branch}"),
        author: "octocat".into(),
        kind: EventKind::Push,
        from_branch: String::new(),
        to_branch: branch.into(),
        timestamp: "2024-05-01T11:00:00Z".into(),
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response =
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn empty_store_yields_empty_page() {
    let store = Arc::new(MemoryEventStore::new());
    let app = test_router(store);

    let (status, body) = get_json(app, "/webhook/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 0);
    assert_eq!(body["events"], serde_json::json!([]));
}

#[tokio::test]
async fn events_are_returned_newest_first() {
    let store = Arc::new(MemoryEventStore::new());
    for branch in ["first", "second", "third"] {
        store.record(push_event(branch)).await.unwrap();
    }
    let app = test_router(store);

    let (status, body) = get_json(app, "/webhook/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["events"][0]["to_branch"], "third");
    assert_eq!(body["events"][2]["to_branch"], "first");
}

#[tokio::test]
async fn event_fields_are_rendered_flat() {
    let store = Arc::new(MemoryEventStore::new());
    store
        .record(CanonicalEvent {
            request_id: "delivery-9".into(),
            author: "hubot".into(),
            kind: EventKind::PullRequest { sub_action: "OPENED".into() },
            from_branch: "feature-x".into(),
            to_branch: "main".into(),
            timestamp: "2024-05-01T10:30:00Z".into(),
        })
        .await
        .unwrap();
    let app = test_router(store);

    let (_, body) = get_json(app, "/webhook/events").await;

    let event = &body["events"][0];
    assert_eq!(event["request_id"], "delivery-9");
    assert_eq!(event["author"], "hubot");
    assert_eq!(event["action"], "PULL_REQUEST");
    assert_eq!(event["pr_action"], "OPENED");
    assert_eq!(event["from_branch"], "feature-x");
    assert_eq!(event["to_branch"], "main");
    assert_eq!(event["timestamp"], "2024-05-01T10:30:00Z");
    assert!(event["id"].as_str().is_some_and(|id| id.len() == 36));
    assert!(event["created_at"].as_str().is_some());
}

#[tokio::test]
async fn poll_limit_bounds_the_page() {
    let store = Arc::new(MemoryEventStore::new());
    for i in 0..5 {
        store.record(push_event(&format!("branch-{i}"))).await.unwrap();
    }
    let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let state = AppState::new(store, Arc::new(clock)).with_poll_limit(2);
    let app = create_router(state);

    let (status, body) = get_json(app, "/webhook/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["events"][0]["to_branch"], "branch-4");
    assert_eq!(body["events"][1]["to_branch"], "branch-3");
}

#[tokio::test]
async fn store_failure_surfaces_as_internal_error() {
    let store = Arc::new(MemoryEventStore::new());
    store.fail_lists("store unreachable: connection refused").await;
    let app = test_router(store);

    let (status, body) = get_json(app, "/webhook/events").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().is_some_and(|msg| msg.contains("unreachable")));
}

#[tokio::test]
async fn root_serves_fallback_page_when_asset_is_missing() {
    let store = Arc::new(MemoryEventStore::new());
    let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let state =
        AppState::new(store, Arc::new(clock)).with_static_dir("definitely-not-a-directory");
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("Webhook Receiver Active"));
}

#[tokio::test]
async fn webhook_root_serves_the_same_page() {
    let store = Arc::new(MemoryEventStore::new());
    let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let state =
        AppState::new(store, Arc::new(clock)).with_static_dir("definitely-not-a-directory");
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/webhook/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
