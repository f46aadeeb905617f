//! Answer generation over retrieved context
//!
//! Builds one bounded context block from the merged retrieval results,
//! selects the intent template, and requests a single completion. Missing
//! provider configuration and empty retrieval both map to fixed answers
//! instead of errors.

use super::prompts::{
    intent_instructions, BASE_INSTRUCTIONS, CONFIGURATION_ERROR_ANSWER, NO_INFORMATION_ANSWER,
};
use crate::config::LlmServiceConfig;
use crate::intent::Intent;
use crate::kinship::{kinship_table_markdown, mentions_kinship};
use crate::llm::{ChatMessage, GenerativeClient};
use crate::retrieval::RetrievedFragment;
use std::sync::Arc;

/// Upper bound on the assembled context block, in characters
pub const MAX_CONTEXT_CHARS: usize = 60_000;

/// Produces the final natural-language answer
pub struct AnswerGenerator {
    client: Arc<dyn GenerativeClient>,
    service: LlmServiceConfig,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn GenerativeClient>, service: LlmServiceConfig) -> Self {
        Self { client, service }
    }

    /// Generate an answer for `query` over the retrieved fragments.
    ///
    /// Returns the fixed no-information answer for an empty retrieval set
    /// and the fixed configuration-error answer when the provider is not
    /// configured. Transport failures degrade to the no-information answer.
    pub async fn generate(
        &self,
        query: &str,
        intent: Intent,
        fragments: &[RetrievedFragment],
    ) -> String {
        if fragments.is_empty() {
            return NO_INFORMATION_ANSWER.to_string();
        }
        if !self.service.is_configured() {
            tracing::error!("generative service is not configured");
            return CONFIGURATION_ERROR_ANSWER.to_string();
        }

        let context = build_context(query, intent, fragments);
        let system = format!(
            "{}\n\n{}",
            BASE_INSTRUCTIONS,
            intent_instructions(intent)
        );
        let user = format!("CONTEXTO:\n{}\n\nPREGUNTA: {}", context, query);

        match self
            .client
            .chat_completion(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
        {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => NO_INFORMATION_ANSWER.to_string(),
            Err(e) => {
                tracing::error!("answer generation failed: {}", e);
                NO_INFORMATION_ANSWER.to_string()
            }
        }
    }
}

/// Assemble the bounded context block. Fragments keep their merge order;
/// leave queries touching kinship get the kinship table appended.
pub fn build_context(query: &str, intent: Intent, fragments: &[RetrievedFragment]) -> String {
    let mut context = String::new();

    for item in fragments {
        let header = match &item.fragment.article_ref {
            Some(article) => format!(
                "--- {} ({}) ---\n",
                item.fragment.document_title, article
            ),
            None => format!("--- {} ---\n", item.fragment.document_title),
        };
        let entry_len = header.len() + item.fragment.content.len() + 2;
        if context.len() + entry_len > MAX_CONTEXT_CHARS {
            break;
        }
        context.push_str(&header);
        context.push_str(&item.fragment.content);
        context.push_str("\n\n");
    }

    if intent == Intent::Leave && mentions_kinship(query) {
        let table = kinship_table_markdown();
        if context.len() + table.len() <= MAX_CONTEXT_CHARS {
            context.push_str(&table);
        }
    }

    context
}
