//! Activity log endpoints over the embedded store.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use presence_core::RequestContext;
use serde_json::{json, Value};

#[tokio::test]
async fn test_log_and_read_back() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/activities")
        .add_header("X-User-Id", "42")
        .json(&fixtures::activity_body("test_action", Some(json!({"k": "v"}))))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["user_id"], 42);

    let body: Value = server.get("/activities").add_query_param("limit", 1).await.json();
    assert_eq!(body["count"], 1);
    let entry = &body["data"][0];
    assert_eq!(entry["id"], created["id"]);
    assert_eq!(entry["action"], "test_action");
    assert_eq!(entry["data"], json!({"k": "v"}));
    assert_eq!(entry["user_id"], 42);
    assert_eq!(entry["timestamp"], fixtures::T0);
}

#[tokio::test]
async fn test_explicit_user_and_validation() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let created: Value = server
        .post("/activities")
        .add_header("X-User-Id", "1")
        .json(&fixtures::activity_body_for("impersonated", 9))
        .await
        .json();
    assert_eq!(created["user_id"], 9);

    let response = server
        .post("/activities")
        .json(&fixtures::activity_body("", None))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_log_is_capped() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let anon = RequestContext::anonymous();

    for i in 0..=1000 {
        ctx.state
            .activity
            .log(&format!("action_{i}"), None, None, &anon)
            .await;
    }

    let body: Value = server
        .get("/activities")
        .add_query_param("limit", 5000)
        .await
        .json();
    assert_eq!(body["count"], 1000);
    assert_eq!(body["data"][0]["action"], "action_1000");
    assert_eq!(body["data"][999]["action"], "action_1");

    let body: Value = server
        .get("/activities")
        .add_query_param("limit", 2)
        .add_query_param("offset", 998)
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][1]["action"], "action_1");
}

#[tokio::test]
async fn test_offset_beyond_index_range_is_empty() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for action in ["oldest", "middle", "newest"] {
        server
            .post("/activities")
            .json(&fixtures::activity_body(action, None))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get("/activities")
        .add_query_param("offset", "18446744073709551615")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_user_activities() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for (action, user) in [("a", 42), ("b", 7), ("c", 42), ("d", 42)] {
        server
            .post("/activities")
            .json(&fixtures::activity_body_for(action, user))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body: Value = server
        .get("/users/42/activities")
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["action"], "d");
    assert_eq!(body["data"][1]["action"], "c");
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["user_id"] == 42));
}

#[tokio::test]
async fn test_search() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/activities")
        .add_header("X-Forwarded-For", "192.168.0.10")
        .json(&fixtures::activity_body("login", None))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/activities")
        .add_header("X-Forwarded-For", "10.1.1.1")
        .json(&fixtures::activity_body("Upload", Some(json!({"file": "Q3-Report.pdf"}))))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server
        .get("/activities/search")
        .add_query_param("q", "192.168")
        .await
        .json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["action"], "login");

    let body: Value = server
        .get("/activities/search")
        .add_query_param("q", "q3-report")
        .await
        .json();
    assert_eq!(body["data"][0]["action"], "Upload");

    let body: Value = server
        .get("/activities/search")
        .add_query_param("q", "UPLOAD")
        .await
        .json();
    assert_eq!(body["count"], 1);

    server
        .get("/activities/search")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats() {
    let ctx = TestContext::new();
    let server = ctx.server();

    // yesterday in UTC
    server
        .post("/activities")
        .json(&fixtures::activity_body_for("login", 1))
        .await;
    ctx.clock.advance_secs(7_200);

    let actions = [
        ("view", 1),
        ("view", 2),
        ("view", 3),
        ("login", 2),
        ("comment", 1),
        ("share", 4),
        ("like", 4),
        ("logout", 1),
    ];
    for (action, user) in actions {
        server
            .post("/activities")
            .json(&fixtures::activity_body_for(action, user))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let stats: Value = server.get("/activities/stats").await.json();
    assert_eq!(stats["total_activities"], 9);
    assert_eq!(stats["today_activities"], 8);
    assert_eq!(stats["unique_users_count"], 4);

    let top = stats["top_actions"].as_array().unwrap();
    assert_eq!(top.len(), 5);
    assert_eq!(top[0]["action"], "view");
    assert_eq!(top[0]["count"], 3);
    assert_eq!(top[1]["action"], "login");
    assert_eq!(top[1]["count"], 2);
    let counts: Vec<u64> = top.iter().map(|a| a["count"].as_u64().unwrap()).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_clear_logs() {
    let ctx = TestContext::new();
    let server = ctx.server();

    for action in ["a", "b", "c"] {
        server
            .post("/activities")
            .json(&fixtures::activity_body(action, None))
            .await;
    }

    let body: Value = server.delete("/activities").await.json();
    assert_eq!(body["cleared"], 3);

    let body: Value = server.get("/activities").await.json();
    assert_eq!(body["count"], 0);
    let stats: Value = server.get("/activities/stats").await.json();
    assert_eq!(stats["total_activities"], 0);
    assert_eq!(stats["top_actions"], json!([]));
}
