//! Shared test harness for E2E integration tests.
//!
//! Wires the real classifier, dialog router and HTTP layer to in-memory
//! collaborators whose calls and transcript lines can be inspected.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use sb_dialog::mock::{InMemoryStore, MemoryLog};
use sb_dialog::{DialogConfig, SentimentScorer};
use sb_nlu::{KeywordSentiment, RuleClassifier};
use sb_server::routes::build_router;
use sb_server::state::AppState;

/// End-to-end test harness over the sample catalog.
pub struct TestHarness {
    pub state: AppState,
    pub router: Router,
    /// Sample orders, products and FAQs; supports failure injection.
    pub store: Arc<InMemoryStore>,
    /// Every transcript line the agent recorded.
    pub log: Arc<MemoryLog>,
}

impl TestHarness {
    pub fn with_sample_data() -> Self {
        Self::with_scorer(Arc::new(KeywordSentiment::new()), DialogConfig::default())
    }

    pub fn with_scorer(scorer: Arc<dyn SentimentScorer>, config: DialogConfig) -> Self {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let log = Arc::new(MemoryLog::new());
        let state = AppState::build(
            Arc::new(RuleClassifier::default()),
            store.clone(),
            scorer,
            log.clone(),
            config,
        );
        let router = build_router(state.clone());
        Self {
            state,
            router,
            store,
            log,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    /// POST /api/v1/sessions and return the new session id.
    pub async fn start_session(&self, user_id: &str) -> (StatusCode, Value) {
        let request = Request::post("/api/v1/sessions")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "user_id": user_id }).to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST a user message to a session.
    pub async fn say(&self, session_id: &str, text: &str) -> (StatusCode, Value) {
        let request = Request::post(format!("/api/v1/sessions/{session_id}/messages"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "text": text, "user_id": "u-e2e", "channel": "webchat" }).to_string(),
            ))
            .unwrap();
        self.send(request).await
    }

    pub async fn get_session(&self, session_id: &str) -> (StatusCode, Value) {
        let request = Request::get(format!("/api/v1/sessions/{session_id}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn end_session(&self, session_id: &str) -> (StatusCode, Value) {
        let request = Request::delete(format!("/api/v1/sessions/{session_id}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}
