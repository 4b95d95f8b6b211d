use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use turngate_core::config::{BusinessConfig, TurngateConfig};
use turngate_identity::{AnchorRefetch, IdentityLookup};
use turngate_llm::{AnthropicProvider, LlmProvider};
use turngate_orchestrator::Orchestrator;
use turngate_sessions::{IdempotencyCache, SecurityEventLog, SessionLock, SessionMapper, StateStore};
use turngate_tools::{ExecutorConfig, ToolRegistry};

use crate::identity_store::SqliteIdentityStore;

/// Baseline system prompt handed to every business until per-business
/// prompt customization lands (§4.9, §4.12 — out of scope for now, the
/// knowledge-base-grounded reply text is the guardrail chain's job, not
/// the prompt's).
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a customer service assistant for a business. \
Answer only using tool results; never invent order, payment, or account details. \
If the customer's identity needs verification before you can look something up, ask for it.";

const DEFAULT_MAX_TOKENS: u32 = 1024;
const THROTTLE_MAX_PER_WINDOW: usize = 20;
const THROTTLE_WINDOW: Duration = Duration::from_secs(60);

/// Central shared state — passed as `Arc<AppState>` to every Axum handler.
pub struct AppState {
    pub config: TurngateConfig,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: TurngateConfig) -> anyhow::Result<Self> {
        let path = &config.database.path;
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mapper_conn = Connection::open(path)?;
        let lock_conn = Connection::open(path)?;
        let state_conn = Connection::open(path)?;
        let idempotency_conn = Connection::open(path)?;
        let security_conn = Connection::open(path)?;
        let identity_conn = Connection::open(path)?;

        turngate_sessions::db::init_db(&mapper_conn)?;
        crate::identity_store::init_db(&identity_conn)?;

        let identity_store = Arc::new(SqliteIdentityStore::new(identity_conn));
        let identity_lookup: Arc<dyn IdentityLookup> = identity_store.clone();
        let anchor_refetch: Arc<dyn AnchorRefetch> = identity_store;

        let api_key = config.llm.anthropic_api_key.clone().unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("no anthropic_api_key configured — LLM calls will fail");
        }
        let llm: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::new(api_key, config.llm.anthropic_base_url.clone()));

        let orchestrator = Orchestrator {
            mapper: SessionMapper::new(mapper_conn),
            lock: SessionLock::new(lock_conn),
            state_store: StateStore::new(state_conn, config.sessions.state_ttl_secs),
            idempotency: IdempotencyCache::new(idempotency_conn),
            security_events: SecurityEventLog::new(security_conn),
            tools: ToolRegistry::new(),
            identity_lookup,
            anchor_refetch,
            llm,
            throttle: turngate_orchestrator::preflight::SessionThrottle::new(THROTTLE_MAX_PER_WINDOW, THROTTLE_WINDOW),
            executor_config: ExecutorConfig {
                timeout_ms: config.tools.timeout_ms,
                max_attempts: config.tools.max_attempts,
                backoff_base_ms: config.tools.backoff_base_ms,
            },
        };

        Ok(Self { config, orchestrator })
    }

    pub fn business(&self, id: &str) -> Option<&BusinessConfig> {
        self.config.businesses.iter().find(|b| b.id == id)
    }

    pub fn max_tokens(&self) -> u32 {
        DEFAULT_MAX_TOKENS
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/turn", post(crate::http::turn::turn_handler))
        .route("/webhooks/{source}", post(crate::http::webhooks::webhook_handler))
        .route("/healthz", get(crate::http::health::healthz))
        .route("/readyz", get(crate::http::health::readyz))
        .route("/v1/session/{id}", get(crate::http::session::session_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
