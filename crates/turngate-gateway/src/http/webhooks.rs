//! Webhook ingress endpoint — POST /webhooks/:source (§4.1, §6).
//!
//! One source per inbound channel provider (e.g. `whatsapp`, `email`), each
//! authenticated independently per its `auth_mode` in
//! `TurngateConfig::webhooks`. The webhook's own provider-specific envelope
//! is assumed already normalized upstream (by the provider's own delivery
//! adapter) into the flat shape `WebhookPayload` expects — this endpoint's
//! job is authentication and translating that shape into a turn.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{info, warn};
use turngate_core::config::{WebhookAuthMode, DEFAULT_MAX_TOOL_ITERATIONS_EMAIL};
use turngate_core::{BusinessId, Channel};
use turngate_orchestrator::{OrchestratorConfig, TurnRequest};

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Deserialize)]
pub struct WebhookPayload {
    pub business_id: String,
    pub channel_user_id: String,
    pub message: String,
    #[serde(default)]
    pub channel_identifier: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let cfg = &state.config.webhooks;

    if !cfg.enabled {
        warn!(source = %source, "webhook received but the subsystem is disabled");
        return Err((StatusCode::NOT_FOUND, Json(json!({"error": "webhook subsystem is disabled"}))));
    }

    let source_cfg = cfg.sources.iter().find(|s| s.name == source).ok_or_else(|| {
        warn!(source = %source, "unknown webhook source");
        (StatusCode::NOT_FOUND, Json(json!({"error": "unknown webhook source"})))
    })?;

    info!(source = %source, bytes = body.len(), "webhook arrived");

    match &source_cfg.auth_mode {
        WebhookAuthMode::HmacSha256 => {
            verify_hmac_sha256(&headers, &body, source_cfg.secret.as_deref()).map_err(|e| auth_error(&e))?;
        }
        WebhookAuthMode::BearerToken => {
            verify_bearer_token(&headers, source_cfg.secret.as_deref()).map_err(|e| auth_error(&e))?;
        }
        WebhookAuthMode::None => {}
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!(source = %source, error = %e, "invalid JSON in webhook body");
        (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid JSON body"})))
    })?;

    let channel: Channel = source.parse().map_err(|_| {
        warn!(source = %source, "webhook source name is not a recognized channel");
        (StatusCode::BAD_REQUEST, Json(json!({"error": "webhook source is not a recognized channel"})))
    })?;

    let business = state.business(&payload.business_id).ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(json!({"error": "unknown business_id"})))
    })?;

    if payload.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "message cannot be empty"}))));
    }

    let business_id = BusinessId::from(business.id.as_str());
    let config = OrchestratorConfig {
        model: state.config.llm.model.clone(),
        max_tokens: state.max_tokens(),
        max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS_EMAIL,
        language: business.default_language.clone(),
        enumeration_threshold: state.config.sessions.enumeration_threshold,
        pii_lock_ttl_secs: state.config.sessions.pii_lock_ttl_secs,
        enumeration_lock_ttl_secs: state.config.sessions.enumeration_lock_ttl_secs,
        channel_proof_autoverify: business.channel_proof_autoverify,
    };

    let req = TurnRequest {
        business: &business_id,
        channel,
        channel_user_id: &payload.channel_user_id,
        explicit_session_id: payload.session_id.as_deref(),
        user_message: &payload.message,
        channel_identifier: payload.channel_identifier.as_deref(),
        system_prompt: crate::app::DEFAULT_SYSTEM_PROMPT,
        config: &config,
    };

    let response = state.orchestrator.handle_incoming_message(req).await.map_err(|e| {
        warn!(source = %source, error = %e, "failed to process webhook turn");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "internal error"})))
    })?;

    info!(source = %source, session_id = %response.session_id, "webhook turn processed");
    Ok(Json(json!({"ok": true, "session_id": response.session_id.as_str(), "reply": response.reply})))
}

fn verify_hmac_sha256(headers: &HeaderMap, body: &Bytes, secret: Option<&str>) -> Result<(), String> {
    let secret = secret.ok_or_else(|| "no HMAC secret configured for this source".to_string())?;

    let sig_header = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing X-Hub-Signature-256 header".to_string())?;

    let sig_hex = sig_header
        .strip_prefix("sha256=")
        .ok_or_else(|| "malformed X-Hub-Signature-256 header".to_string())?;

    let expected = hex::decode(sig_hex).map_err(|_| "X-Hub-Signature-256 is not valid hex".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "invalid HMAC key length".to_string())?;
    mac.update(body);

    mac.verify_slice(&expected).map_err(|_| "HMAC signature mismatch".to_string())
}

fn verify_bearer_token(headers: &HeaderMap, secret: Option<&str>) -> Result<(), String> {
    let expected = secret.ok_or_else(|| "no bearer token configured for this source".to_string())?;

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| "missing or malformed Authorization header".to_string())?;

    if token == expected {
        Ok(())
    } else {
        Err("bearer token mismatch".to_string())
    }
}

fn auth_error(reason: &str) -> (StatusCode, Json<Value>) {
    warn!(reason = %reason, "webhook authentication failed");
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "authentication failed", "reason": reason})))
}
