//! Behaviour when every store command fails.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

#[tokio::test]
async fn test_reads_surface_store_errors() {
    let ctx = TestContext::failing();
    let server = ctx.server();

    for path in [
        "/presence/online",
        "/presence/online/count",
        "/presence/users/1",
        "/activities",
        "/activities/stats",
    ] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["code"], "STORE_001", "{path}");
    }
}

#[tokio::test]
async fn test_writes_surface_store_errors() {
    let ctx = TestContext::failing();
    let server = ctx.server();

    let response = server
        .post("/activities")
        .json(&fixtures::activity_body("login", None))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    server
        .post("/presence/heartbeat")
        .add_header("X-User-Id", "1")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_best_effort_log_swallows_errors() {
    let ctx = TestContext::failing();
    let before = telemetry::metrics().activity_log_failures.get();

    ctx.state
        .activity
        .log("login", None, Some(1), &presence_core::RequestContext::anonymous())
        .await;

    assert!(telemetry::metrics().activity_log_failures.get() > before);
}

#[tokio::test]
async fn test_presence_tracking_never_fails_requests() {
    let ctx = TestContext::failing();
    let server = ctx.server();

    server
        .get("/admin/cache/stats")
        .add_header("X-User-Id", "1")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_admin_views_degrade() {
    let ctx = TestContext::failing();
    let server = ctx.server();

    let body: Value = server.get("/admin/users").await.json();
    assert_eq!(body["count"], 4);
    for row in body["data"].as_array().unwrap() {
        assert_eq!(row["online_status"], "Unknown");
        assert_eq!(row["last_activity"], "Error");
    }

    let body: Value = server.get("/admin/dashboard").await.json();
    assert_eq!(body["online_users"], 0);
    assert_eq!(body["total_users"], 4);

    let stats: Value = server.get("/admin/cache/stats").await.json();
    assert_eq!(stats["total_keys"], 0);
    assert_eq!(stats["memory_usage"], "N/A");
    assert_eq!(stats["hit_ratio"], "N/A");
}

#[tokio::test]
async fn test_health_reports_store_down() {
    let ctx = TestContext::failing();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store_connected"], false);
    assert_eq!(body["store_backend"], "failing");

    server.get("/health/live").await.assert_status_ok();
}
