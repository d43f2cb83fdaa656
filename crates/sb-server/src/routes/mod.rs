//! API route definitions and router builder.

pub mod health;
pub mod sessions;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/sessions", post(sessions::start_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route("/sessions/{id}/messages", post(sessions::post_message));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::with_sample_data())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn start_session_returns_welcome() {
        let response = app()
            .oneshot(post_json("/api/v1/sessions", serde_json::json!({"user_id": "u-1"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert!(!json["session_id"].as_str().unwrap().is_empty());
        assert!(json["text"].as_str().unwrap().contains("Welcome"));
    }

    #[tokio::test]
    async fn start_session_rejects_blank_user() {
        let response = app()
            .oneshot(post_json("/api/v1/sessions", serde_json::json!({"user_id": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn message_returns_turn_reply() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/sessions/s-1/messages",
                serde_json::json!({"text": "hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["intent"], "greeting");
        assert_eq!(json["action"], "reply");
        assert_eq!(json["template"], "welcome");
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/sessions/s-1/messages",
                serde_json::json!({"text": "   "}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn oversized_message_is_bad_request() {
        let text = "a".repeat(sessions::MAX_MESSAGE_CHARS + 1);
        let response = app()
            .oneshot(post_json(
                "/api/v1/sessions/s-1/messages",
                serde_json::json!({"text": text}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let response = app()
            .oneshot(Request::get("/api/v1/sessions/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app()
            .oneshot(Request::delete("/api/v1/sessions/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/sessions/s-9/messages",
                serde_json::json!({"text": "track my order"}),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["action"], "prompt_slot");

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/sessions/s-9").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["dialog"]["state"], "awaiting_slot");
        assert_eq!(json["dialog"]["target"], "track_order");
        assert_eq!(json["turns"], 1);

        let response = app
            .clone()
            .oneshot(Request::delete("/api/v1/sessions/s-9").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::get("/api/v1/sessions/s-9").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
