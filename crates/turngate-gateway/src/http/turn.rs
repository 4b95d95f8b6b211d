//! POST /v1/turn — the one synchronous entrypoint every channel adapter
//! (chat widget, WhatsApp webhook translator, email poller) funnels an
//! inbound message through (§4.1, §4.12).

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use turngate_core::config::{DEFAULT_MAX_TOOL_ITERATIONS_CHAT, DEFAULT_MAX_TOOL_ITERATIONS_EMAIL};
use turngate_core::{BusinessId, Channel};
use turngate_orchestrator::{OrchestratorConfig, TurnRequest};

use crate::app::AppState;

#[derive(Deserialize)]
pub struct TurnBody {
    pub business_id: String,
    pub channel: String,
    pub channel_user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    /// Sender phone (WhatsApp) or sender email (Email) — used to derive the
    /// identity proof (§4.5). Absent on the chat channel.
    #[serde(default)]
    pub channel_identifier: Option<String>,
}

#[derive(Serialize)]
pub struct TurnResponseBody {
    pub session_id: String,
    pub reply: String,
    pub outcome: turngate_core::Outcome,
    pub response_grounding: turngate_core::ResponseGrounding,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub tools_called: Vec<String>,
    pub metadata: turngate_orchestrator::TurnMetadata,
}

pub async fn turn_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TurnBody>,
) -> Result<Json<TurnResponseBody>, (StatusCode, Json<Value>)> {
    if !crate::auth::check_auth(&state, &headers) {
        return Err(unauthorized());
    }

    let business = state.business(&body.business_id).ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({"error": "unknown business_id"})))
    })?;

    let channel: Channel = body.channel.parse().map_err(|_| {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "unknown channel"})))
    })?;

    if body.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "message cannot be empty"}))));
    }

    let business_id = BusinessId::from(business.id.as_str());
    let max_tool_iterations = if channel.is_synchronous() {
        DEFAULT_MAX_TOOL_ITERATIONS_CHAT
    } else {
        DEFAULT_MAX_TOOL_ITERATIONS_EMAIL
    };

    let config = OrchestratorConfig {
        model: state.config.llm.model.clone(),
        max_tokens: state.max_tokens(),
        max_tool_iterations,
        language: business.default_language.clone(),
        enumeration_threshold: state.config.sessions.enumeration_threshold,
        pii_lock_ttl_secs: state.config.sessions.pii_lock_ttl_secs,
        enumeration_lock_ttl_secs: state.config.sessions.enumeration_lock_ttl_secs,
        channel_proof_autoverify: business.channel_proof_autoverify,
    };

    let req = TurnRequest {
        business: &business_id,
        channel,
        channel_user_id: &body.channel_user_id,
        explicit_session_id: body.session_id.as_deref(),
        user_message: &body.message,
        channel_identifier: body.channel_identifier.as_deref(),
        system_prompt: crate::app::DEFAULT_SYSTEM_PROMPT,
        config: &config,
    };

    let response = state.orchestrator.handle_incoming_message(req).await.map_err(|e| {
        warn!(error = %e, "turn handling failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "internal error"})))
    })?;

    Ok(Json(TurnResponseBody {
        session_id: response.session_id.as_str().to_string(),
        reply: response.reply,
        outcome: response.outcome,
        response_grounding: response.response_grounding,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        tools_called: response.tools_called,
        metadata: response.metadata,
    }))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized. set 'Authorization: Bearer <token>' header"})),
    )
}
