//! The Orchestrator (§4.12): drives session resolution, the pre-LLM
//! deterministic exits, the classifier/router, the identity + verification
//! flow, the tool loop, the guardrail chain's bounded re-prompt loop,
//! response grounding, and persistence — in that order, for every turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use turngate_core::{
    BusinessId, Channel, CorrectionType, GuardrailAction, GuardrailVerdict, Outcome, ResponseGrounding,
    SessionId, TurnId, TurnState,
};
use turngate_guardrails::chain::{self, CorrectionTracker};
use turngate_guardrails::context::GuardrailContext;
use turngate_identity::{
    apply_autoverify, derive_identity_proof, proof_applies_to, AnchorRefetch, ChannelContext,
    IdentityLookup,
};
use turngate_llm::provider::{ChatRequest, LlmProvider, Message, Role};
use turngate_llm::{detect_anchor_change, run_tool_loop, RequestBuilder};
use turngate_sessions::{ChatLogEntry, IdempotencyCache, SecurityEventLog, SessionLock, SessionMapper, StateStore};
use turngate_tools::{fail_template as tool_fail_template, ToolContext, ToolExecutor, ToolRegistry};

use crate::classifier::{self, MessageType};
use crate::error::Result;
use crate::grounding::{self, GroundingInput};
use crate::metrics::{self, SecurityTelemetry, TurnTelemetry};
use crate::outcome_contract;
use crate::preflight::{self, SessionThrottle};
use crate::router::{self, RouteDecision};
use crate::{identity_flow, OrchestratorConfig};

const MAX_REPROMPT_ROUNDS: u32 = 4;

/// All collaborators a running business needs, bundled once by the gateway
/// at startup (§6 "ambient stack" — mirrors how `turngate-tools`' executor
/// bundles registry + idempotency rather than threading both separately).
pub struct Orchestrator {
    pub mapper: SessionMapper,
    pub lock: SessionLock,
    pub state_store: StateStore,
    pub idempotency: IdempotencyCache,
    pub security_events: SecurityEventLog,
    pub tools: ToolRegistry,
    pub identity_lookup: Arc<dyn IdentityLookup>,
    pub anchor_refetch: Arc<dyn AnchorRefetch>,
    pub llm: Arc<dyn LlmProvider>,
    pub throttle: SessionThrottle,
    pub executor_config: turngate_tools::ExecutorConfig,
}

/// One inbound message, already demultiplexed by channel/business at the
/// gateway boundary (§4.1, §6).
pub struct TurnRequest<'a> {
    pub business: &'a BusinessId,
    pub channel: Channel,
    pub channel_user_id: &'a str,
    pub explicit_session_id: Option<&'a str>,
    pub user_message: &'a str,
    pub channel_identifier: Option<&'a str>,
    pub system_prompt: &'a str,
    pub config: &'a OrchestratorConfig,
}

/// One tool's closed-set outcome, surfaced to the caller alongside the
/// reply (§6 `toolOutcomes[]`) — the caller never sees `ToolResult::data`,
/// only the name + outcome pair needed to explain what happened this turn.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolOutcomeEntry {
    pub name: String,
    pub outcome: Outcome,
}

/// The "LLM was called, and why" trace plus guardrail/classification tags
/// (§4.12, §6 `metadata{...}`). Populated identically whether the turn was
/// a pre-LLM bypass or ran the full pipeline.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TurnMetadata {
    pub outcome: Outcome,
    pub guardrail_action: GuardrailAction,
    pub message_type: Option<String>,
    pub llm_called: bool,
    pub llm_call_reason: String,
    pub bypassed: bool,
    pub response_grounding: ResponseGrounding,
    pub kb_confidence: Option<f32>,
    pub tool_outcomes: Vec<ToolOutcomeEntry>,
}

#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub reply: String,
    pub outcome: Outcome,
    pub response_grounding: ResponseGrounding,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub tools_called: Vec<String>,
    pub metadata: TurnMetadata,
}

impl Orchestrator {
    pub async fn handle_incoming_message(&self, req: TurnRequest<'_>) -> Result<TurnResponse> {
        let started = Instant::now();
        let turn_id = TurnId::new();

        let session_id = match req.explicit_session_id {
            Some(explicit) => match self.mapper.resolve(explicit)? {
                Some(id) => id,
                // §4.1: an explicitly supplied sessionId MUST NOT be minted —
                // an unresolvable one is a hard DENIED, not a silent new session.
                None => {
                    let unresolved = SessionId::from(explicit);
                    return Ok(self.bypass(
                        &unresolved,
                        &turn_id,
                        started,
                        "session_id_not_found",
                        Outcome::Denied,
                        fallback_text(req.config.language.as_str()),
                        req.user_message,
                    ));
                }
            },
            None => self.mapper.get_or_create(req.business, req.channel, req.channel_user_id)?,
        };

        if let Some(status) = self.lock.is_locked(&session_id)? {
            let reply = turngate_sessions::lock_message(status.reason, req.config.language.as_str());
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "session_locked",
                Outcome::Denied,
                reply,
                req.user_message,
            ));
        }

        let mut state = self.state_store.get_state(&session_id)?;

        if matches!(state.flow_status, turngate_core::FlowStatus::Terminated) {
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "session_terminated",
                Outcome::Denied,
                fallback_text(req.config.language.as_str()),
                req.user_message,
            ));
        }

        if preflight::check_content_safety(req.user_message) {
            self.security_events.record(Some(&session_id), "CONTENT_SAFETY", req.user_message)?;
            self.lock.lock_session(
                &session_id,
                turngate_core::LockReason::ContentSafety,
                req.config.pii_lock_ttl_secs * 1000,
            )?;
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "content_safety",
                Outcome::Denied,
                fallback_text(req.config.language.as_str()),
                req.user_message,
            ));
        }

        if preflight::check_critical_prompt_injection(req.user_message) {
            self.security_events.record(Some(&session_id), "PROMPT_INJECTION", req.user_message)?;
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "prompt_injection",
                Outcome::Denied,
                fallback_text(req.config.language.as_str()),
                req.user_message,
            ));
        }

        if self.throttle.record_and_check(session_id.as_str()) {
            self.security_events.record(Some(&session_id), "SESSION_THROTTLED", "turn rate exceeded")?;
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "session_throttled",
                Outcome::Denied,
                fallback_text(req.config.language.as_str()),
                req.user_message,
            ));
        }

        // Anchor-change handling happens before classification (§4.10): a
        // mention of a different order number always wins over a stale
        // pending verification.
        if let Some(new_order) = detect_anchor_change(req.user_message, &state) {
            state.handle_anchor_change(&new_order);
        }

        let mut classification = None;
        if classifier::should_run(&state) {
            let c = classifier::classify(req.user_message);
            if !matches!(state.verification.status, turngate_core::VerificationStatus::Pending) {
                classifier::merge_slots(&mut state, &c.extracted_slots);
            }
            classification = Some(c);
        }

        // Pending verification is resolved deterministically before the LLM
        // ever sees the turn — gated tool exposure is empty while pending
        // (`ToolRegistry::gated_for`), so there is no tool the LLM could use
        // to check it itself.
        let mut pre_tool_results = Vec::new();
        if matches!(state.verification.status, turngate_core::VerificationStatus::Pending) {
            if let Some(input) = classifier::extract_verification_input(req.user_message) {
                if let Some(result) = identity_flow::check_verification_input(&state, &input) {
                    pre_tool_results.push(result);
                }
            }
        }

        if let Some(lock_reason) =
            outcome_contract::apply_state_events(&mut state, &pre_tool_results, req.config.enumeration_threshold)
        {
            self.lock.lock_session(&session_id, lock_reason, req.config.enumeration_lock_ttl_secs * 1000)?;
            let reply = turngate_sessions::lock_message(lock_reason, req.config.language.as_str());
            self.state_store.persist(&session_id, state, &self.log_entries(req.user_message, &reply))?;
            return Ok(self.bypass(
                &session_id,
                &turn_id,
                started,
                "enumeration_lock",
                Outcome::Denied,
                reply,
                req.user_message,
            ));
        }

        let proof = if proof_applies_to(req.channel) {
            let ctx = match (req.channel, req.channel_identifier) {
                (Channel::Whatsapp, Some(phone)) => ChannelContext::Whatsapp { sender_phone: phone },
                (Channel::Email, Some(email)) => ChannelContext::Email { sender_email: email },
                _ => ChannelContext::Chat,
            };
            Some(derive_identity_proof(&ctx, self.identity_lookup.as_ref()).await)
        } else {
            None
        };

        let intent = classification.as_ref().map(|c| router::route(c, &state)).and_then(|d| match d {
            RouteDecision::ChatterAck => None,
            RouteDecision::RunIntentRouter { intent } => Some(intent),
        });

        let history: Vec<Message> = self
            .state_store
            .recent_log(&session_id, 20)?
            .into_iter()
            .map(|e| Message {
                role: if e.role == "assistant" { Role::Assistant } else { Role::User },
                content: e.text,
            })
            .collect();

        let injection_context = intent.as_deref().map(|i| format!("Detected intent: {i}"));

        let builder = RequestBuilder { model: req.config.model.clone(), max_tokens: req.config.max_tokens, registry: &self.tools };
        let request: ChatRequest = builder.build(
            req.system_prompt,
            injection_context.as_deref(),
            &history,
            req.user_message,
            &state,
        );

        let tool_ctx = ToolContext {
            business: req.business,
            channel: req.channel,
            session_id: &session_id,
            state: &state,
            language: req.config.language.as_str(),
        };
        let executor = ToolExecutor { registry: &self.tools, idempotency: &self.idempotency, config: self.executor_config.clone() };

        let mut loop_result = run_tool_loop(
            self.llm.as_ref(),
            &executor,
            request,
            req.config.max_tool_iterations,
            &tool_ctx,
            &session_id,
            &turn_id,
            req.config.language.as_str(),
        )
        .await?;

        identity_flow::capture_anchor_if_needed(&mut state, &loop_result.tool_results);

        if loop_result.terminal_outcome == Some(Outcome::VerificationRequired) {
            if let (Some(proof), Some(last)) = (&proof, loop_result.tool_results.last().cloned()) {
                let anchor_customer_id = state.anchor.as_ref().and_then(|a| a.customer_id.as_deref());
                let anchor_id = state.anchor.as_ref().map(|a| a.id.as_str()).unwrap_or_default();
                let source_table = state.anchor.as_ref().map(|a| a.source_table.as_str()).unwrap_or_default();
                let upgraded = apply_autoverify(
                    last,
                    req.config.channel_proof_autoverify,
                    proof,
                    anchor_customer_id,
                    anchor_id,
                    source_table,
                    self.anchor_refetch.as_ref(),
                )
                .await;
                if upgraded.outcome == Outcome::Ok {
                    if let Some(slot) = loop_result.tool_results.last_mut() {
                        *slot = upgraded;
                    }
                    loop_result.terminal_outcome = None;
                    loop_result.had_tool_success = true;
                    if loop_result.reply.is_empty() {
                        loop_result.reply = verified_reply(req.config.language.as_str());
                    }
                }
            }
        }

        let all_tool_results: Vec<_> =
            pre_tool_results.iter().cloned().chain(loop_result.tool_results.iter().cloned()).collect();

        if let Some(lock_reason) =
            outcome_contract::apply_state_events(&mut state, &loop_result.tool_results, req.config.enumeration_threshold)
        {
            self.lock.lock_session(&session_id, lock_reason, req.config.enumeration_lock_ttl_secs * 1000)?;
        }

        let tool_required_intents: Vec<String> =
            self.tools.tool_required_names().into_iter().map(str::to_string).collect();

        let mut draft = if loop_result.reply.is_empty() {
            match loop_result.terminal_outcome {
                Some(Outcome::VerificationRequired) => verification_prompt_text(&state, req.config.language.as_str()),
                Some(Outcome::InfraError) => tool_fail_template(req.config.language.as_str()).to_string(),
                _ => fallback_text(req.config.language.as_str()),
            }
        } else {
            loop_result.reply.clone()
        };

        let mut security = SecurityTelemetry::default();
        let mut correction_tracker = CorrectionTracker::new();

        // A tool INFRA_ERROR is already the deterministic safe template
        // (§4.8): the guardrail chain never re-runs and the LLM is never
        // re-prompted to paraphrase it — re-prompting would be exactly the
        // confabulation-around-a-failure the template exists to avoid.
        let verdict = if loop_result.terminal_outcome == Some(Outcome::InfraError) {
            GuardrailVerdict::pass("tool_infra_error")
        } else {
            loop {
                let ctx = GuardrailContext {
                    response: &draft,
                    language: req.config.language.as_str(),
                    state: &state,
                    tool_results: &all_tool_results,
                    intent: intent.as_deref(),
                    tool_required_intents: &tool_required_intents,
                    had_tool_success: loop_result.had_tool_success,
                };
                let verdict = chain::run(&ctx);
                security.record_guardrail(verdict.action, verdict.filter);

                match verdict.action {
                    GuardrailAction::Pass => break verdict,
                    GuardrailAction::Sanitize | GuardrailAction::Block => {
                        if let Some(text) = &verdict.final_response {
                            draft = text.clone();
                        }
                        if let Some(reason) = verdict.lock {
                            self.lock.lock_session(&session_id, reason, req.config.pii_lock_ttl_secs * 1000)?;
                        }
                        break verdict;
                    }
                    GuardrailAction::NeedMinInfoForTool => {
                        if let Some(correction) = &verdict.needs_correction {
                            if correction_tracker.try_attempt(correction.r#type) && security.reprompt_count < MAX_REPROMPT_ROUNDS {
                                security.record_reprompt();
                                draft = self.reprompt_for_correction(req.system_prompt, &draft, &correction.constraint, &req).await?;
                                continue;
                            }
                            draft = correction_fallback(correction.r#type, req.config.language.as_str());
                            break verdict;
                        }
                        draft = clarification_text(&verdict.missing_fields, req.config.language.as_str());
                        break verdict;
                    }
                }
            }
        };

        let final_outcome = outcome_contract::derive_final_outcome(loop_result.terminal_outcome, &all_tool_results, &verdict);

        let kb_confidence = classification.as_ref().map(|c| c.confidence);
        let is_chatter = classification.as_ref().map(|c| c.message_type == MessageType::Chatter).unwrap_or(false);
        let response_grounding = grounding::classify(&GroundingInput {
            is_chatter,
            tool_results_succeeded: loop_result.had_tool_success,
            kb_confidence,
            final_outcome,
            response_text: &draft,
        });
        state.response_grounding = Some(response_grounding);

        self.state_store.persist(&session_id, state, &self.log_entries_tagged(req.user_message, &draft, &classification, &verdict, response_grounding))?;

        security.latency_ms = started.elapsed().as_millis() as u64;
        security.injection_detected = false;
        let telemetry = TurnTelemetry {
            security,
            kb_confidence,
            entity_resolver: None,
            tools_called: loop_result.tools_called.clone(),
            outcome: final_outcome,
            response_grounding: Some(response_grounding),
        };
        metrics::emit(turn_id.as_str(), session_id.as_str(), &telemetry);
        info!(
            turn_id = %turn_id,
            session_id = %session_id,
            llm_called = true,
            bypassed = false,
            "LLM_CALL_TRACE"
        );

        let metadata = TurnMetadata {
            outcome: final_outcome,
            guardrail_action: verdict.action,
            message_type: classification.as_ref().map(|c| format!("{:?}", c.message_type)),
            llm_called: true,
            llm_call_reason: req.channel.as_str().to_string(),
            bypassed: false,
            response_grounding,
            kb_confidence,
            tool_outcomes: all_tool_results
                .iter()
                .map(|r| ToolOutcomeEntry { name: r.name.clone(), outcome: r.outcome })
                .collect(),
        };

        Ok(TurnResponse {
            session_id,
            reply: draft,
            outcome: final_outcome,
            response_grounding,
            input_tokens: loop_result.input_tokens,
            output_tokens: loop_result.output_tokens,
            tools_called: loop_result.tools_called.clone(),
            metadata,
        })
    }

    async fn reprompt_for_correction(
        &self,
        system_prompt: &str,
        draft: &str,
        constraint: &str,
        req: &TurnRequest<'_>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: req.config.model.clone(),
            system: format!("{system_prompt}\n\nYour previous draft violated a policy: {constraint}\nRewrite the reply to satisfy it, responding with only the corrected reply text."),
            messages: vec![Message { role: Role::Assistant, content: draft.to_string() }],
            max_tokens: req.config.max_tokens,
            tools: vec![],
            raw_messages: None,
        };
        let response = self.llm.send(&request).await?;
        Ok(response.content)
    }

    fn log_entries(&self, user_message: &str, reply: &str) -> Vec<ChatLogEntry> {
        vec![
            ChatLogEntry { role: "user".into(), text: user_message.to_string(), message_type: None, guardrail_action: None, response_grounding: None },
            ChatLogEntry { role: "assistant".into(), text: reply.to_string(), message_type: None, guardrail_action: None, response_grounding: None },
        ]
    }

    fn log_entries_tagged(
        &self,
        user_message: &str,
        reply: &str,
        classification: &Option<crate::classifier::Classification>,
        verdict: &turngate_core::GuardrailVerdict,
        grounding: ResponseGrounding,
    ) -> Vec<ChatLogEntry> {
        vec![
            ChatLogEntry {
                role: "user".into(),
                text: user_message.to_string(),
                message_type: classification.as_ref().map(|c| format!("{:?}", c.message_type)),
                guardrail_action: None,
                response_grounding: None,
            },
            ChatLogEntry {
                role: "assistant".into(),
                text: reply.to_string(),
                message_type: None,
                guardrail_action: Some(format!("{:?}", verdict.action)),
                response_grounding: Some(format!("{grounding:?}")),
            },
        ]
    }

    fn bypass(
        &self,
        session_id: &SessionId,
        turn_id: &TurnId,
        started: Instant,
        reason: &'static str,
        outcome: Outcome,
        reply: String,
        user_message: &str,
    ) -> TurnResponse {
        let mut security = SecurityTelemetry::default();
        security.latency_ms = started.elapsed().as_millis() as u64;
        if reason == "session_throttled" {
            security.session_throttled = true;
        }
        if reason == "prompt_injection" {
            security.injection_detected = true;
        }
        let telemetry = TurnTelemetry {
            security,
            kb_confidence: None,
            entity_resolver: None,
            tools_called: Vec::new(),
            outcome,
            response_grounding: None,
        };
        metrics::emit(turn_id.as_str(), session_id.as_str(), &telemetry);
        info!(
            turn_id = %turn_id,
            session_id = %session_id,
            llm_called = false,
            bypassed = true,
            reason,
            "LLM_CALL_TRACE"
        );
        let _ = user_message;
        let response_grounding = ResponseGrounding::Clarification;
        let metadata = TurnMetadata {
            outcome,
            guardrail_action: GuardrailAction::Pass,
            message_type: None,
            llm_called: false,
            llm_call_reason: reason.to_string(),
            bypassed: true,
            response_grounding,
            kb_confidence: None,
            tool_outcomes: Vec::new(),
        };
        TurnResponse {
            session_id: session_id.clone(),
            reply,
            outcome,
            response_grounding,
            input_tokens: 0,
            output_tokens: 0,
            tools_called: Vec::new(),
            metadata,
        }
    }
}

fn fallback_text(language: &str) -> String {
    if language.eq_ignore_ascii_case("tr") {
        "Bu talebi şu anda işleyemiyoruz. Lütfen müşteri hizmetlerimizle iletişime geçin.".to_string()
    } else {
        "We're unable to process this request right now. Please contact customer support.".to_string()
    }
}

fn verified_reply(language: &str) -> String {
    if language.eq_ignore_ascii_case("tr") {
        "Kimliğinizi doğruladık, hemen kontrol ediyorum.".to_string()
    } else {
        "Thanks, you're verified — let me check that for you.".to_string()
    }
}

fn verification_prompt_text(state: &TurnState, language: &str) -> String {
    let ask_name = state.anchor.as_ref().map(|a| a.phone.is_none()).unwrap_or(true);
    match (ask_name, language.eq_ignore_ascii_case("tr")) {
        (true, true) => "Güvenliğiniz için lütfen kayıtlı ad ve soyadınızı paylaşır mısınız?".to_string(),
        (true, false) => "For your security, could you share the full name on the account?".to_string(),
        (false, true) => "Güvenliğiniz için lütfen telefon numaranızın son 4 hanesini paylaşır mısınız?".to_string(),
        (false, false) => "For your security, could you share the last 4 digits of your phone number?".to_string(),
    }
}

fn clarification_text(missing_fields: &[String], language: &str) -> String {
    let joined = missing_fields.join(", ");
    if language.eq_ignore_ascii_case("tr") {
        format!("Devam edebilmem için şu bilgilere ihtiyacım var: {joined}.")
    } else {
        format!("I need a bit more information to continue: {joined}.")
    }
}

fn correction_fallback(correction_type: CorrectionType, language: &str) -> String {
    match (correction_type, language.eq_ignore_ascii_case("tr")) {
        (CorrectionType::Confabulation, true) | (CorrectionType::ToolOnlyDataLeak, true) | (CorrectionType::InternalProtocolLeak, true) => {
            "Bu konuda şu anda kesin bir bilgi paylaşamıyorum. Müşteri hizmetlerimizle iletişime geçebilirsiniz.".to_string()
        }
        _ => "I can't confirm that with certainty right now. Please contact customer support for details.".to_string(),
    }
}
