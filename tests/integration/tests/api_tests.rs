//! API Integration Tests
//!
//! Most scenarios run the full HTTP stack over in-memory stores and fake
//! providers. Tests marked as needing a database require:
//! - Running PostgreSQL instance
//! - Environment variable: DATABASE_URL
//!
//! Run with: cargo test -p integration-tests --test api_tests

use chorus_service::services::inbound::UNREGISTERED_REPLY;
use chorus_service::testing::{MemoryObjectStore, TestHarness};
use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, wait_until, TestServer,
};
use reqwest::StatusCode;

const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

fn congregation() -> TestHarness {
    let harness = TestHarness::new();
    harness.admin(PASTOR.0, PASTOR.1);
    for (phone, name) in MEMBERS {
        harness.member(phone, name);
    }
    harness
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let harness = TestHarness::new();
    let server = TestServer::start(&harness).await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_ready() {
    let harness = TestHarness::new();
    let server = TestServer::start(&harness).await.expect("Failed to start server");

    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();

    harness.objects.set_broken(true);
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value =
        assert_json(response, StatusCode::SERVICE_UNAVAILABLE).await.unwrap();
    assert_eq!(body["checks"]["storage"]["status"], "unhealthy");
}

// ============================================================================
// Broadcast Tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_everyone_but_sender() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(MEMBERS[0].0, "  Potluck after service Sunday!  ");
    let response = server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), EMPTY_TWIML);

    wait_until(|| harness.store.logs().len() == 4).await.unwrap();

    assert!(harness.sms.sent_to(MEMBERS[0].0).is_empty());
    for (phone, _) in MEMBERS.iter().skip(1).chain([&PASTOR]) {
        let sent = harness.sms.sent_to(phone);
        assert_eq!(sent.len(), 1, "expected one message to {phone}");
        assert_eq!(sent[0].body, "Jane Doe: Potluck after service Sunday!");
    }
    assert!(harness.store.logs().iter().all(|log| log.is_sent()));

    let messages = harness.store.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].original_text, "  Potluck after service Sunday!  ");
}

#[tokio::test]
async fn test_broadcast_with_photo_is_relocated() {
    let harness = congregation();
    harness
        .fetcher
        .serve("https://carrier.test/media/0", b"\xFF\xD8\xFFjpeg", "image/jpeg");
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(MEMBERS[1].0, "Retreat photo")
        .with_media("https://carrier.test/media/0", "image/jpeg");
    let response = server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    wait_until(|| harness.store.logs().len() == 4).await.unwrap();

    let keys = harness.objects.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(".jpg"));

    let sent = harness.sms.sent_to(MEMBERS[0].0);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].media_urls,
        vec![format!("{}/{}", MemoryObjectStore::BASE_URL, keys[0])]
    );
    assert_eq!(harness.store.media().len(), 1);
}

#[tokio::test]
async fn test_failed_recipient_does_not_block_others() {
    let harness = congregation();
    harness.sms.always_fail(MEMBERS[2].0);
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(PASTOR.0, "Service cancelled due to snow");
    server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();

    // four deliveries plus the summary reply to the admin
    wait_until(|| !harness.sms.sent_to(PASTOR.0).is_empty()).await.unwrap();

    let logs = harness.store.logs();
    assert_eq!(logs.len(), 4);
    assert_eq!(logs.iter().filter(|log| !log.is_sent()).count(), 1);

    let summary = &harness.sms.sent_to(PASTOR.0)[0].body;
    assert!(summary.starts_with("Broadcast sent to 3 of 4 members (1 failed)."));
}

#[tokio::test]
async fn test_unregistered_sender_is_rejected() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text("+19995550123", "hello?");
    server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();

    wait_until(|| !harness.sms.sent_to("+19995550123").is_empty()).await.unwrap();
    assert_eq!(harness.sms.sent_to("+19995550123")[0].body, UNREGISTERED_REPLY);
    assert_eq!(harness.sms.sent().len(), 1);
    assert!(harness.store.messages().is_empty());
}

// ============================================================================
// Command Tests
// ============================================================================

#[tokio::test]
async fn test_admin_adds_member() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(PASTOR.0, "ADD 206-555-9999 Grace Kim");
    server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();

    wait_until(|| !harness.sms.sent_to(PASTOR.0).is_empty()).await.unwrap();
    assert_eq!(
        harness.sms.sent_to(PASTOR.0)[0].body,
        "Added Grace Kim (+12065559999)"
    );

    let added = harness.store.member_by_phone("+12065559999").unwrap();
    assert_eq!(added.name, "Grace Kim");
    assert!(!added.is_admin);
    assert!(harness.store.messages().is_empty());
}

#[tokio::test]
async fn test_member_cannot_run_admin_commands() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(MEMBERS[0].0, "REMOVE +14255552222");
    server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();

    wait_until(|| !harness.sms.sent_to(MEMBERS[0].0).is_empty()).await.unwrap();
    assert!(harness.store.member_by_phone(MEMBERS[1].0).is_some());
    assert_eq!(harness.store.members().len(), 5);
}

#[tokio::test]
async fn test_wipe_requires_confirmation() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    server
        .post_form("/sms/incoming", &InboundForm::text(PASTOR.0, "WIPE").pairs())
        .await
        .unwrap();
    wait_until(|| harness.sms.sent_to(PASTOR.0).len() == 1).await.unwrap();
    assert_eq!(harness.store.members().len(), 5);

    server
        .post_form("/sms/incoming", &InboundForm::text(PASTOR.0, "wipe confirm").pairs())
        .await
        .unwrap();
    wait_until(|| harness.sms.sent_to(PASTOR.0).len() == 2).await.unwrap();
    assert!(harness.store.members().is_empty());
    assert!(harness.sms.sent_to(PASTOR.0)[1].body.starts_with("Wiped 5 members"));
}

// ============================================================================
// Status Callback and Debug Tests
// ============================================================================

#[tokio::test]
async fn test_status_callback_acknowledged() {
    let harness = TestHarness::new();
    let server = TestServer::start(&harness).await.unwrap();

    let response = server
        .post_form("/sms/status", &status_callback("SM123", "delivered"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_debug_stats_after_broadcast() {
    let harness = congregation();
    let server = TestServer::start(&harness).await.unwrap();

    let inbound = InboundForm::text(MEMBERS[3].0, "Thank you all!");
    server.post_form("/sms/incoming", &inbound.pairs()).await.unwrap();
    wait_until(|| harness.store.logs().len() == 4).await.unwrap();

    let response = server.get("/debug/stats").await.unwrap();
    let stats: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats["counts"]["members"], 5);
    assert_eq!(stats["counts"]["admins"], 1);
    assert_eq!(stats["counts"]["messages"], 1);
    assert_eq!(stats["counts"]["delivery_logs"], 4);
    assert_eq!(stats["recent_broadcasts"].as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Database-backed Tests
// ============================================================================

#[tokio::test]
async fn test_database_server_starts() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start_with_database()
        .await
        .expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/debug/stats").await.expect("Request failed");
    let stats: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(stats["counts"]["members"].is_number());
}
