//! Presence endpoints over the embedded store.

use axum::http::StatusCode;
use integration_tests::{fixtures, mocks::CountingStore, setup::TestContext};
use presence_core::ManualClock;
use serde_json::Value;
use std::sync::Arc;
use store::MemoryStore;

#[tokio::test]
async fn test_heartbeat_requires_identity() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.post("/presence/heartbeat").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_heartbeat_marks_online() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/presence/heartbeat")
        .add_header("X-User-Id", "7")
        .add_header("X-Forwarded-For", "192.168.1.20, 10.0.0.1")
        .add_header("User-Agent", "Mozilla/5.0 (Test)")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user_id"], 7);
    assert_eq!(body["is_online"], true);
    assert_eq!(body["activity"]["ip_address"], "192.168.1.20");
    assert_eq!(body["activity"]["user_agent"], "Mozilla/5.0 (Test)");

    let body: Value = server.get("/presence/online").await.json();
    assert_eq!(body["data"], serde_json::json!([7]));
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_heartbeat_marks_once() {
    let clock = Arc::new(ManualClock::at_timestamp(fixtures::T0));
    let store = Arc::new(CountingStore::new(MemoryStore::with_clock(clock.clone())));
    let ctx = TestContext::with_store(store.clone(), clock);
    let server = ctx.server();

    server
        .post("/presence/heartbeat")
        .add_header("X-User-Id", "7")
        .await
        .assert_status_ok();
    assert_eq!(store.zadd_calls(), 1);

    // other routes are marked by the tracking layer
    server
        .get("/presence/online")
        .add_header("X-User-Id", "7")
        .await
        .assert_status_ok();
    assert_eq!(store.zadd_calls(), 2);
}

#[tokio::test]
async fn test_identified_requests_refresh_presence() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .get("/activities")
        .add_header("X-User-Id", "3")
        .await
        .assert_status_ok();

    assert!(ctx.state.presence.is_user_online(3).await.unwrap());
}

#[tokio::test]
async fn test_anonymous_requests_leave_no_trace() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server.get("/activities").await.assert_status_ok();
    server
        .get("/activities")
        .add_header("X-User-Id", "not-a-number")
        .await
        .assert_status_ok();

    let body: Value = server.get("/presence/online/count").await.json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_user_goes_offline_at_threshold() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/presence/heartbeat")
        .add_header("X-User-Id", "1")
        .await
        .assert_status_ok();

    ctx.clock.advance_secs(299);
    let body: Value = server.get("/presence/users/1").await.json();
    assert_eq!(body["is_online"], true);

    ctx.clock.advance_secs(1);
    let body: Value = server.get("/presence/users/1").await.json();
    assert_eq!(body["is_online"], false);
    // metadata outlives the online window
    assert!(body["activity"].is_object());
    assert_eq!(body["activity"]["is_online"], false);

    let body: Value = server.get("/presence/online/count").await.json();
    assert_eq!(body["count"], 0);

    ctx.clock.advance_secs(300);
    let body: Value = server.get("/presence/users/1").await.json();
    assert!(body["activity"].is_null());
}

#[tokio::test]
async fn test_online_users_ordered_by_recency() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for id in ["1", "2", "3"] {
        server
            .post("/presence/heartbeat")
            .add_header("X-User-Id", id)
            .await
            .assert_status_ok();
        ctx.clock.advance_secs(10);
    }
    // user 1 again, now most recent
    server
        .post("/presence/heartbeat")
        .add_header("X-User-Id", "1")
        .await
        .assert_status_ok();

    let body: Value = server.get("/presence/online").await.json();
    assert_eq!(body["data"], serde_json::json!([1, 3, 2]));

    let body: Value = server.get("/presence/online/details").await.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"][0]["user_id"], 1);
    assert_eq!(body["data"][0]["activity"]["is_online"], true);
}

#[tokio::test]
async fn test_unknown_user_presence() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body: Value = server.get("/presence/users/12345").await.json();
    assert_eq!(body["is_online"], false);
    assert!(body["activity"].is_null());

    server
        .get("/presence/users/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
