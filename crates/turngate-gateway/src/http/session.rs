//! GET /v1/session/:id — debug/inspection endpoint for support staff: the
//! persisted turn state plus recent chat log for one session. Auth-gated
//! the same as the turn/webhook endpoints; never exposed without a token
//! in production (§4.7 — state includes the stashed identity anchor).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use turngate_core::SessionId;
use turngate_sessions::ChatLogEntry;

use crate::app::AppState;

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub state: turngate_core::TurnState,
    pub recent_log: Vec<ChatLogEntry>,
}

pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, (StatusCode, Json<Value>)> {
    if !crate::auth::check_auth(&state, &headers) {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))));
    }

    let session_id = SessionId::from(id.clone());

    let turn_state = state
        .orchestrator
        .state_store
        .get_state(&session_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;

    let recent_log = state
        .orchestrator
        .state_store
        .recent_log(&session_id, 50)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;

    Ok(Json(SessionView { session_id: id, state: turn_state, recent_log }))
}
