use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /healthz — liveness probe. Always returns 200 once the process is up.
pub async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// GET /readyz — readiness probe: the gateway is only ready once its sqlite
/// connections actually answer a query.
pub async fn readyz(State(state): State<Arc<AppState>>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.orchestrator.state_store.ping().map_err(|e| {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "not ready", "error": e.to_string()})))
    })?;

    Ok(Json(json!({
        "status": "ready",
        "businesses": state.config.businesses.len(),
    })))
}
