//! E2E tests for collaborator failures and request validation.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::TestHarness;
use sb_dialog::DialogConfig;
use sb_dialog::mock::FailingScorer;
use sb_server::config::ScorerConfig;
use sb_server::scorer::HttpScorer;

#[tokio::test]
async fn e2e_store_outage_apologizes_and_keeps_slot() {
    let h = TestHarness::with_sample_data();

    h.say("s-down", "track my order").await;
    h.store.set_failing(true);

    let (status, reply) = h.say("s-down", "ORD-2026-00001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["action"], "apology");
    assert_eq!(reply["template"], "apology");
    let text = reply["text"].as_str().unwrap();
    assert!(text.contains("support@ecommerce.com"));
    assert!(!text.contains("store offline"));

    let (_, view) = h.get_session("s-down").await;
    assert_eq!(view["dialog"]["state"], "awaiting_slot");
    assert_eq!(view["dialog"]["attempts"], 0);

    // Once the store recovers, the same answer completes the dialog.
    h.store.set_failing(false);
    let (_, reply) = h.say("s-down", "ORD-2026-00001").await;
    assert_eq!(reply["template"], "order_status");
}

#[tokio::test]
async fn e2e_slow_store_times_out() {
    let config = DialogConfig {
        collaborator_timeout_ms: 50,
        ..DialogConfig::default()
    };
    let h = TestHarness::with_scorer(Arc::new(sb_nlu::KeywordSentiment::new()), config);
    h.store.set_delay(Some(Duration::from_millis(500)));

    let (_, reply) = h.say("s-slow", "show me headphones").await;
    assert_eq!(reply["action"], "apology");
}

#[tokio::test]
async fn e2e_scorer_failure_falls_back_to_neutral() {
    let h = TestHarness::with_scorer(Arc::new(FailingScorer), DialogConfig::default());

    let (status, reply) = h.say("s-neutral", "hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["intent"], "greeting");
    assert_eq!(reply["sentiment"]["label"], "neutral");
}

#[tokio::test]
async fn e2e_http_scorer_labels_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sentiment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sentiment": "negative",
            "score": 0.9,
            "compound": -0.85
        })))
        .mount(&server)
        .await;

    let scorer = HttpScorer::new(&ScorerConfig {
        url: server.uri(),
        timeout_ms: 1000,
    })
    .unwrap();
    let h = TestHarness::with_scorer(Arc::new(scorer), DialogConfig::default());

    let (_, reply) = h.say("s-mood", "where is my order ORD-2026-00001").await;
    assert_eq!(reply["sentiment"]["label"], "negative");
    assert_eq!(reply["sentiment"]["compound"], -0.85);
    assert_eq!(reply["template"], "order_status");
}

#[tokio::test]
async fn e2e_low_confidence_threshold_downgrades() {
    let config = DialogConfig {
        min_confidence: 0.95,
        ..DialogConfig::default()
    };
    let h = TestHarness::with_scorer(Arc::new(sb_nlu::KeywordSentiment::new()), config);

    // product_search fires at 0.88, below the threshold.
    let (_, reply) = h.say("s-strict", "I need a laptop").await;
    assert_eq!(reply["intent"], "unknown");
    assert_eq!(reply["action"], "fallback");
    assert_eq!(h.store.calls("search_products"), 0);
}

#[tokio::test]
async fn e2e_empty_text_rejected() {
    let h = TestHarness::with_sample_data();

    let (status, json) = h.say("s-empty", "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(h.log.is_empty());
}

#[tokio::test]
async fn e2e_unknown_session_not_found() {
    let h = TestHarness::with_sample_data();

    let (status, json) = h.get_session("missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing"));

    let (status, _) = h.end_session("missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
