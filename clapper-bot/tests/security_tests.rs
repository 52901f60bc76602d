//! Security tests for clapper-bot
//!
//! Tests security-critical features:
//! - Body size limit on the interaction endpoint
//! - Forged and cross-tenant button tokens

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use clapper_bot::affordance::Affordance;
use clapper_bot::api::interactions::MAX_BODY_BYTES;
use clapper_bot::router::Services;
use clapper_bot::{build_router, AppState};
use clapper_common::db::{init_memory_database, suggestions};
use helpers::*;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn setup_app() -> axum::Router {
    let db = init_memory_database().await.unwrap();
    build_router(AppState::new(Services {
        db,
        lookup: Arc::new(FakeLookup::with(catalog())),
        sink: Arc::new(RecordingSink::default()),
    }))
}

fn padded_interaction(total_len: usize) -> String {
    let head = r#"{"tenant_id":"g1","actor":{"id":"u1","name":""#;
    let tail = r#""},"type":"command","name":"mystats"}"#;
    let padding = total_len - head.len() - tail.len();
    format!("{}{}{}", head, "a".repeat(padding), tail)
}

fn raw_post(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/interactions")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

// =============================================================================
// Body Size Limit Tests
// =============================================================================

/// Bodies over the limit are rejected before parsing
#[tokio::test]
async fn test_body_over_limit_rejected() {
    let app = setup_app().await;

    let response = app
        .oneshot(raw_post(padded_interaction(MAX_BODY_BYTES + 1024)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

/// A body exactly at the limit is accepted
#[tokio::test]
async fn test_body_at_limit_accepted() {
    let app = setup_app().await;

    let response = app
        .oneshot(raw_post(padded_interaction(MAX_BODY_BYTES)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Token Tests
// =============================================================================

/// A well-formed token naming another tenant cannot confirm there
#[tokio::test]
async fn test_forged_cross_tenant_confirm_rejected() {
    let harness = Harness::new().await;
    harness
        .command("g1", &admin("a1"), "setup", &[("channel", "c")])
        .await;
    harness
        .command("g1", &member("u1"), "suggestion", &[("movie", "heat")])
        .await;
    let target = suggestions::find_by_external_ref(&harness.db, "g1", 949)
        .await
        .unwrap()
        .unwrap();

    // Admin of g2 crafts a token pointing at g1's suggestion
    let forged = Affordance::Confirm {
        tenant: "g1".to_string(),
        suggestion_id: target.id,
    }
    .encode();
    let reply = harness.click("g2", &admin("intruder"), &forged).await;
    assert_eq!(content(&reply), "❌ This selection is for a different server.");

    // Token relabelled with the clicker's tenant finds nothing to confirm
    let relabelled = Affordance::Confirm {
        tenant: "g2".to_string(),
        suggestion_id: target.id,
    }
    .encode();
    let reply = harness.click("g2", &admin("intruder"), &relabelled).await;
    assert!(content(&reply).starts_with("❌"));

    assert_eq!(suggestions::count_selected(&harness.db, "g1").await.unwrap(), 0);
    assert_eq!(suggestions::count_selected(&harness.db, "g2").await.unwrap(), 0);
}

/// Browse tokens cannot page through another member's list in another tenant
#[tokio::test]
async fn test_cross_tenant_browse_rejected() {
    let harness = Harness::new().await;
    let token = Affordance::Browse {
        scope: clapper_bot::affordance::BrowseScope::Tenant("g1".to_string()),
        direction: clapper_bot::affordance::Direction::Next,
        index: 0,
    }
    .encode();

    let reply = harness.click("g2", &member("u1"), &token).await;
    assert_eq!(content(&reply), "❌ This selection is for a different server.");
}

/// Oversized tokens are refused without decoding
#[tokio::test]
async fn test_oversized_token_rejected() {
    let harness = Harness::new().await;
    let token = format!("v1.{}", "A".repeat(4096));

    let reply = harness.click("g1", &admin("a1"), &token).await;
    assert!(content(&reply).contains("no longer valid"));
}
