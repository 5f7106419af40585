//! Chat session endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::chat::{ChatMessage, ChatSession};
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, QueryRequest};

/// POST /api/chat
///
/// Runs a conversational turn: retrieval over the message, generation with
/// the session's recent history in the prompt, then the turn is appended
/// to the session. Unknown session ids create a fresh session.
pub async fn chat_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(Error::Invalid("message must not be empty".to_string()));
    }

    let max_history = state.config().chat.max_history;
    let history: Vec<ChatMessage> = state
        .sessions()
        .entry(request.session_id.clone())
        .or_insert_with(|| ChatSession::new(request.session_id.clone(), max_history))
        .messages
        .clone();

    let query = QueryRequest {
        question: request.message.clone(),
        k: request.k,
        include_sources: true,
        include_media: true,
    };
    let response = state.engine().chat_answer(&history, &query).await?;

    if let Some(mut session) = state.sessions().get_mut(&request.session_id) {
        session.push(ChatMessage::user(&request.message));
        session.push(ChatMessage::assistant(&response.answer));
    }

    Ok(Json(ChatResponse {
        session_id: request.session_id,
        question: response.question,
        answer: response.answer,
        sources: response.sources,
        num_sources: response.num_sources,
        media: response.media,
        has_media: response.has_media,
        error: response.error,
    }))
}

/// DELETE /api/chat/:session_id
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    match state.sessions().remove(&session_id) {
        Some(_) => Ok(Json(serde_json::json!({
            "session_id": session_id,
            "cleared": true,
        }))),
        None => Err(Error::NotFound(format!("no session '{}'", session_id))),
    }
}

/// GET /api/chat/:session_id/history
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSession>> {
    state
        .sessions()
        .get(&session_id)
        .map(|session| Json(session.clone()))
        .ok_or_else(|| Error::NotFound(format!("no session '{}'", session_id)))
}
