//! The trackers against a real Redis.
//!
//! Requires Docker to be running for testcontainers, unless
//! `PRESENCE_TEST_REDIS_URL` points at a disposable Redis.
//!
//! Everything runs in one test because the store keys are fixed.

use chrono::Utc;
use integration_tests::{containers::TestContainers, setup::TestContext};
use presence_core::keys::{user_activity_key, ACTIVITY_LOG_KEY, ONLINE_USERS_KEY};
use presence_core::{ManualClock, RequestContext};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracker::{ActivityLog, ActivityLogConfig};

#[tokio::test]
async fn test_redis_end_to_end() {
    let containers = TestContainers::start().await;
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let ctx = TestContext::redis(&containers, clock.clone()).await;
    let store = ctx.store.clone();

    assert_eq!(store.backend(), "redis");
    store.ping().await.unwrap();

    let mut stale = vec![ONLINE_USERS_KEY.to_string(), ACTIVITY_LOG_KEY.to_string()];
    stale.extend((1..=3).map(user_activity_key));
    store.del(&stale).await.unwrap();
    ctx.state.admin_cache.clear_all().await.unwrap();

    // Presence
    let presence = &ctx.state.presence;
    let ctx_for = |id| RequestContext::for_user(id).with_ip("192.168.10.1");

    presence.mark_user_online(Some(1), &ctx_for(1)).await.unwrap();
    clock.advance_secs(10);
    presence.mark_user_online(Some(2), &ctx_for(2)).await.unwrap();
    presence.mark_user_online(Some(2), &ctx_for(2)).await.unwrap();

    assert_eq!(presence.online_users().await.unwrap(), vec![2, 1]);
    let activity = presence.user_activity(1).await.unwrap().unwrap();
    assert_eq!(activity.ip_address.as_deref(), Some("192.168.10.1"));
    assert_eq!(activity.user_agent, None);
    assert!(activity.is_online);

    clock.advance_secs(295);
    assert!(!presence.is_user_online(1).await.unwrap());
    assert_eq!(presence.online_users().await.unwrap(), vec![2]);
    assert_eq!(store.zscore(ONLINE_USERS_KEY, "1").await.unwrap(), None);

    // Activity log
    let log = &ctx.state.activity;
    let anon = RequestContext::anonymous();
    log.log("login", None, Some(1), &ctx_for(1)).await;
    log.log("upload", Some(&json!({"file": "a.png"})), Some(2), &anon).await;
    store
        .lpush(ACTIVITY_LOG_KEY, "{broken".to_string())
        .await
        .unwrap();
    log.log("logout", None, Some(1), &anon).await;

    let recent = log.recent_activities(10, 0).await.unwrap();
    let actions: Vec<_> = recent.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["logout", "upload", "login"]);
    assert_eq!(recent[1].data, Some(json!({"file": "a.png"})));

    assert_eq!(log.user_activities(1, 10).await.unwrap().len(), 2);
    assert_eq!(log.search_activities("192.168", 10).await.unwrap().len(), 1);
    assert_eq!(log.activity_stats().await.unwrap().total_activities, 3);

    let capped = ActivityLog::new(
        store.clone(),
        clock.clone(),
        ActivityLogConfig {
            max_logs: 5,
            ..Default::default()
        },
    );
    for i in 0..7 {
        capped.log(&format!("bulk_{i}"), None, None, &anon).await;
    }
    assert_eq!(capped.len().await.unwrap(), 5);

    log.clear_logs().await.unwrap();
    assert!(log.recent_activities(10, 0).await.unwrap().is_empty());

    // Admin cache
    let admin = &ctx.state.admin_cache;
    admin
        .set_config("theme", &json!({"dark": true}), None)
        .await
        .unwrap();
    assert_eq!(admin.config("theme").await.unwrap(), Some(json!({"dark": true})));

    let stats = admin.user_stats(ctx.users.as_ref()).await.unwrap();
    assert_eq!(stats.total_users, 4);

    let cache_stats = admin.cache_stats().await.unwrap();
    assert_eq!(cache_stats.total_keys, 2);
    assert_ne!(cache_stats.memory_usage, "N/A");
    assert_eq!(admin.clear_all().await.unwrap(), 2);

    // Native expiry
    store
        .set_ex("admin:probe", "1".to_string(), Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(store.get("admin:probe").await.unwrap(), None);

    // HTTP on top
    let server = ctx.server();
    let body: Value = server.get("/health").await.json();
    assert_eq!(body["store_backend"], "redis");
    assert_eq!(body["store_connected"], true);
}
