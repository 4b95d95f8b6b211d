//! Bearer-token auth shared by every HTTP surface this gateway exposes.

use axum::http::HeaderMap;
use turngate_core::config::AuthMode;

use crate::app::AppState;

/// Returns true if the request carries the configured bearer token, or if
/// auth is disabled for this gateway.
pub fn check_auth(state: &AppState, headers: &HeaderMap) -> bool {
    match state.config.gateway.auth.mode {
        AuthMode::None => true,
        AuthMode::Token => {
            let expected = match &state.config.gateway.auth.token {
                Some(t) => t.as_str(),
                None => return false,
            };
            extract_bearer(headers).map(|t| t == expected).unwrap_or(false)
        }
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
