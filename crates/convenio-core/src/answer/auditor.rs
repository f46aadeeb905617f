//! Answer audit pass
//!
//! Re-submits the generated answer with its context under a strict rubric.
//! The verdict is telemetry: it is logged and attached to the response but
//! never blocks delivery. The failure asymmetry is deliberate: a transport
//! failure or timeout fails open (the check never ran, do not punish the
//! user), while any completion that is not a valid verdict fails closed
//! (the check ran and produced garbage, so its approval cannot be trusted).

use super::prompts::AUDIT_RUBRIC;
use crate::llm::{extract_json_object, ChatMessage, GenerativeClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The auditor sees a bounded slice of the generation context; its timeout
/// is short and the rubric does not need the full 60k window.
const MAX_AUDIT_CONTEXT_CHARS: usize = 15_000;

/// Audit verdict attached to chat responses when auditing is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub approved: bool,
    pub reason: String,
    pub risk_level: String,
}

/// Runs the approval rubric over generated answers
pub struct AnswerAuditor {
    client: Arc<dyn GenerativeClient>,
    timeout: Duration,
}

impl AnswerAuditor {
    pub fn new(client: Arc<dyn GenerativeClient>, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Audit `answer` against the context it was generated from.
    pub async fn audit(&self, query: &str, context: &str, answer: &str) -> AuditVerdict {
        let user = format!(
            "PREGUNTA: {}\n\nCONTEXTO:\n{}\n\nRESPUESTA:\n{}",
            query,
            bounded(context),
            answer
        );
        let messages = vec![ChatMessage::system(AUDIT_RUBRIC), ChatMessage::user(user)];

        // chat_completion, not json_completion: a completion that arrives
        // but cannot be parsed is a bad verdict, not a transport failure.
        let call = self.client.chat_completion(messages);
        let verdict = match tokio::time::timeout(self.timeout, call).await {
            // The check ran: anything short of a valid verdict fails closed
            Ok(Ok(response)) => extract_json_object(&response)
                .and_then(|value| serde_json::from_value::<AuditVerdict>(value).ok())
                .unwrap_or_else(|| {
                    tracing::warn!("audit response malformed, failing closed");
                    fail_closed()
                }),
            // The check never ran: fail open
            Ok(Err(e)) => {
                tracing::warn!("audit call failed, failing open: {}", e);
                fail_open()
            }
            Err(_) => {
                tracing::warn!("audit call timed out, failing open");
                fail_open()
            }
        };

        tracing::info!(
            approved = verdict.approved,
            risk_level = %verdict.risk_level,
            reason = %verdict.reason,
            "answer audit verdict"
        );
        verdict
    }
}

fn fail_open() -> AuditVerdict {
    AuditVerdict {
        approved: true,
        reason: "audit unavailable".to_string(),
        risk_level: "unknown".to_string(),
    }
}

fn fail_closed() -> AuditVerdict {
    AuditVerdict {
        approved: false,
        reason: "audit response malformed".to_string(),
        risk_level: "high".to_string(),
    }
}

fn bounded(context: &str) -> &str {
    if context.len() <= MAX_AUDIT_CONTEXT_CHARS {
        return context;
    }
    let mut end = MAX_AUDIT_CONTEXT_CHARS;
    while !context.is_char_boundary(end) {
        end -= 1;
    }
    &context[..end]
}
