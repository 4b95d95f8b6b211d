use std::time::Duration;

use tracing::{instrument, warn};
use turngate_core::{Outcome, SessionId, ToolResult, TurnId};
use turngate_sessions::IdempotencyCache;

use crate::registry::ToolRegistry;
use crate::tool::ToolContext;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { timeout_ms: 8_000, max_attempts: 3, backoff_base_ms: 200 }
    }
}

pub struct ToolExecutor<'a> {
    pub registry: &'a ToolRegistry,
    pub idempotency: &'a IdempotencyCache,
    pub config: ExecutorConfig,
}

impl<'a> ToolExecutor<'a> {
    /// Run a tool by name: validate -> idempotency replay -> retrying,
    /// deadline-bounded execution (§4.8). Never propagates a raw error —
    /// non-recoverable failure becomes a deterministic `INFRA_ERROR`
    /// `ToolResult` with a localized safe template, per §4.8 and §7.
    #[instrument(skip(self, args, ctx), fields(tool = %tool_name, session_id = %session_id))]
    pub async fn run(
        &self,
        tool_name: &str,
        args: serde_json::Value,
        ctx: &ToolContext<'_>,
        session_id: &SessionId,
        turn_id: &TurnId,
        language: &str,
    ) -> ToolResult {
        let Some(tool) = self.registry.get(tool_name) else {
            return ToolResult::new(tool_name, Outcome::InfraError, fail_template(language));
        };

        if let Err(field) = crate::schema::validate(&args, tool.fields()) {
            return ToolResult::new(tool_name, Outcome::ValidationError, format!("field: {field}"));
        }

        let args_hash = turngate_sessions::idempotency::hash_args(&args);
        match self.idempotency.get(session_id, turn_id, tool_name, &args_hash) {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "idempotency cache read failed, proceeding without replay"),
        }

        let mut attempt = 0u32;
        let result = loop {
            attempt += 1;
            let timeout = Duration::from_millis(self.config.timeout_ms);
            let exec = tokio::time::timeout(timeout, tool.execute(args.clone(), ctx)).await;

            match exec {
                Ok(r) if r.outcome != Outcome::InfraError || attempt >= self.config.max_attempts => {
                    break r;
                }
                Ok(_infra_error) if attempt < self.config.max_attempts => {
                    self.sleep_backoff(attempt).await;
                    continue;
                }
                Ok(r) => break r,
                Err(_elapsed) => {
                    if attempt >= self.config.max_attempts {
                        break ToolResult::new(tool_name, Outcome::InfraError, fail_template(language));
                    }
                    self.sleep_backoff(attempt).await;
                    continue;
                }
            }
        };

        if let Err(e) = self.idempotency.put(session_id, turn_id, tool_name, &args_hash, &result) {
            warn!(error = %e, "idempotency cache write failed");
        }
        result
    }

    async fn sleep_backoff(&self, attempt: u32) {
        let backoff_ms = self.config.backoff_base_ms * 2u64.saturating_pow(attempt.saturating_sub(1));
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
    }
}

/// Deterministic, localized safe template for non-recoverable tool failure
/// (§4.8) — the orchestrator never asks the LLM to paraphrase this, to
/// avoid confabulating around a failure it knows nothing about.
pub fn fail_template(language: &str) -> &'static str {
    if language.eq_ignore_ascii_case("tr") {
        "Şu anda bu isteği işleyemiyoruz. Lütfen birazdan tekrar deneyin."
    } else {
        "We're unable to process this request right now. Please try again shortly."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use turngate_core::{BusinessId, Channel, TurnState};

    struct FlakyTool {
        calls: AtomicU32,
        fail_times: u32,
    }

    const NO_FIELDS: &[FieldSpec] = &[];

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn fields(&self) -> &'static [FieldSpec] {
            NO_FIELDS
        }
        async fn execute(&self, _args: serde_json::Value, _ctx: &ToolContext<'_>) -> ToolResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                ToolResult::new("flaky", Outcome::InfraError, "transient")
            } else {
                ToolResult::new("flaky", Outcome::Ok, "ok")
            }
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let conn = Connection::open_in_memory().unwrap();
        turngate_sessions::db::init_db(&conn).unwrap();
        let idem = IdempotencyCache::new(conn);
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FlakyTool { calls: AtomicU32::new(0), fail_times: 2 }));

        let business = BusinessId::from("biz-1");
        let state = TurnState::default();
        let session_id = SessionId::from("conv_test");
        let turn_id = TurnId::new();
        let tool_ctx = ToolContext {
            business: &business,
            channel: Channel::Chat,
            session_id: &session_id,
            state: &state,
            language: "en",
        };

        let executor = ToolExecutor {
            registry: &reg,
            idempotency: &idem,
            config: ExecutorConfig { timeout_ms: 1000, max_attempts: 5, backoff_base_ms: 1 },
        };

        let result = executor
            .run("flaky", serde_json::json!({}), &tool_ctx, &session_id, &turn_id, "en")
            .await;
        assert_eq!(result.outcome, Outcome::Ok);
    }

    #[tokio::test]
    async fn unknown_tool_is_infra_error() {
        let conn = Connection::open_in_memory().unwrap();
        turngate_sessions::db::init_db(&conn).unwrap();
        let idem = IdempotencyCache::new(conn);
        let reg = ToolRegistry::new();
        let business = BusinessId::from("biz-1");
        let state = TurnState::default();
        let session_id = SessionId::from("conv_test");
        let turn_id = TurnId::new();
        let tool_ctx = ToolContext {
            business: &business,
            channel: Channel::Chat,
            session_id: &session_id,
            state: &state,
            language: "en",
        };
        let executor = ToolExecutor { registry: &reg, idempotency: &idem, config: ExecutorConfig::default() };
        let result = executor
            .run("does_not_exist", serde_json::json!({}), &tool_ctx, &session_id, &turn_id, "en")
            .await;
        assert_eq!(result.outcome, Outcome::InfraError);
    }
}
