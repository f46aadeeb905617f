//! Answer generation and audit

mod auditor;
mod generator;
pub mod prompts;

pub use auditor::{AnswerAuditor, AuditVerdict};
pub use generator::{build_context, AnswerGenerator, MAX_CONTEXT_CHARS};
pub use prompts::{CONFIGURATION_ERROR_ANSWER, NO_INFORMATION_ANSWER};
