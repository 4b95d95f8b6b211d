//! Response Grounding Classifier (§4.13). Tags the final response as
//! `GROUNDED`, `CLARIFICATION`, or `OUT_OF_SCOPE` for telemetry and to pick
//! between a confident-answer, ask-for-clarification, or redirect shape —
//! this crate doesn't pick response wording, only the tag; callers downstream
//! (the LLM's system prompt, or a template layer outside this scope) use it.

use turngate_core::{Outcome, ResponseGrounding};

pub struct GroundingInput<'a> {
    pub is_chatter: bool,
    pub tool_results_succeeded: bool,
    pub kb_confidence: Option<f32>,
    pub final_outcome: Outcome,
    pub response_text: &'a str,
}

const KB_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Chatter is always `GROUNDED` (there's nothing to ground — it's not a
/// factual claim). A tool success backs the response directly. A confident
/// KB match backs it indirectly. Anything else that still produced an
/// answer-shaped outcome (`OK`) without backing is `OUT_OF_SCOPE` — the
/// response asserts something neither a tool nor the KB actually supports.
/// `NOT_FOUND`/`VALIDATION_ERROR`/`VERIFICATION_REQUIRED`/`NEED_MORE_INFO`
/// read as `CLARIFICATION` since the turn is asking the user for something,
/// not asserting a fact.
pub fn classify(input: &GroundingInput) -> ResponseGrounding {
    if input.is_chatter {
        return ResponseGrounding::Grounded;
    }
    match input.final_outcome {
        Outcome::NotFound
        | Outcome::ValidationError
        | Outcome::VerificationRequired
        | Outcome::NeedMoreInfo => ResponseGrounding::Clarification,
        Outcome::Denied | Outcome::InfraError => ResponseGrounding::OutOfScope,
        Outcome::Ok => {
            if input.tool_results_succeeded {
                return ResponseGrounding::Grounded;
            }
            match input.kb_confidence {
                Some(conf) if conf >= KB_CONFIDENCE_THRESHOLD => ResponseGrounding::Grounded,
                _ => {
                    if input.response_text.trim().is_empty() {
                        ResponseGrounding::Clarification
                    } else {
                        ResponseGrounding::OutOfScope
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base<'a>(text: &'a str) -> GroundingInput<'a> {
        GroundingInput {
            is_chatter: false,
            tool_results_succeeded: false,
            kb_confidence: None,
            final_outcome: Outcome::Ok,
            response_text: text,
        }
    }

    #[test]
    fn chatter_is_always_grounded() {
        let mut input = base("merhaba!");
        input.is_chatter = true;
        assert_eq!(classify(&input), ResponseGrounding::Grounded);
    }

    #[test]
    fn successful_tool_call_is_grounded() {
        let mut input = base("Your order is out for delivery.");
        input.tool_results_succeeded = true;
        assert_eq!(classify(&input), ResponseGrounding::Grounded);
    }

    #[test]
    fn high_kb_confidence_without_tools_is_grounded() {
        let mut input = base("We accept returns within 30 days.");
        input.kb_confidence = Some(0.9);
        assert_eq!(classify(&input), ResponseGrounding::Grounded);
    }

    #[test]
    fn unbacked_answer_is_out_of_scope() {
        let input = base("Your refund was processed yesterday.");
        assert_eq!(classify(&input), ResponseGrounding::OutOfScope);
    }

    #[test]
    fn not_found_outcome_is_clarification() {
        let mut input = base("I couldn't find that order, could you share it again?");
        input.final_outcome = Outcome::NotFound;
        assert_eq!(classify(&input), ResponseGrounding::Clarification);
    }

    #[test]
    fn denied_outcome_is_out_of_scope() {
        let mut input = base("I can't share that.");
        input.final_outcome = Outcome::Denied;
        assert_eq!(classify(&input), ResponseGrounding::OutOfScope);
    }
}
