//! Conversation session endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sb_dialog::TurnReply;
use sb_protocol::session::{DialogState, SessionId, Utterance};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Longest message accepted from a channel, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

const DEFAULT_USER: &str = "anonymous";
const DEFAULT_CHANNEL: &str = "webchat";

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: SessionId,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Current dialog position of a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub dialog: DialogState,
    pub turns: u32,
    pub updated_at: DateTime<Utc>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/v1/sessions: open a session and return the welcome message.
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> ApiResult<(StatusCode, Json<StartSessionResponse>)> {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".into()));
    }
    let channel = non_blank(req.channel).unwrap_or_else(|| DEFAULT_CHANNEL.to_string());

    let session_id = SessionId::generate();
    let welcome = state
        .agent
        .start_session(&session_id, user_id, &channel)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            text: welcome.text,
        }),
    ))
}

/// POST /api/v1/sessions/:id/messages: handle one user message.
///
/// Messages for a session id the bot has not seen start a fresh dialog.
pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> ApiResult<Json<TurnReply>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    if req.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let utterance = Utterance::new(
        session_id,
        non_blank(req.user_id).unwrap_or_else(|| DEFAULT_USER.to_string()),
        non_blank(req.channel).unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        req.text,
    );
    Ok(Json(state.agent.handle_turn(&utterance).await))
}

/// GET /api/v1/sessions/:id: current dialog state.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let id = SessionId::from(session_id);
    let conversation = state
        .agent
        .session_state(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("session '{id}' not found")))?;

    Ok(Json(SessionView {
        session_id: id,
        dialog: conversation.dialog,
        turns: conversation.turns,
        updated_at: conversation.updated_at,
    }))
}

/// DELETE /api/v1/sessions/:id: end a session.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = SessionId::from(session_id);
    if state.agent.end_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("session '{id}' not found")))
    }
}
