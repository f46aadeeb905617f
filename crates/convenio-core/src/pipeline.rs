//! Request pipeline: normalize, retrieve, detect, calculate, answer, audit
//!
//! One request runs these stages sequentially; each stage degrades to a
//! documented fallback instead of failing the request.

use crate::answer::{build_context, AnswerAuditor, AnswerGenerator, AuditVerdict};
use crate::calc::{detect, CalculationKind, CalculationOutcome, HybridExtractionCalculator};
use crate::db::Database;
use crate::model::FragmentType;
use crate::query::QueryNormalizer;
use crate::retrieval::{ResultMerger, RetrievedFragment};
use chrono::Datelike;
use serde::Serialize;
use tokio::sync::Mutex;

/// Default number of fragments fed to the answer stage
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 8;

/// Summary of one source fragment returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub id: i64,
    pub document_title: String,
    pub article_ref: Option<String>,
    pub company: String,
    pub score: f32,
}

/// Full chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditVerdict>,
}

/// Orchestrates one conversational request end to end
pub struct ChatPipeline {
    normalizer: QueryNormalizer,
    merger: ResultMerger,
    hybrid: HybridExtractionCalculator,
    generator: AnswerGenerator,
    auditor: Option<AnswerAuditor>,
    limit: usize,
}

impl ChatPipeline {
    pub fn new(
        normalizer: QueryNormalizer,
        merger: ResultMerger,
        hybrid: HybridExtractionCalculator,
        generator: AnswerGenerator,
        auditor: Option<AnswerAuditor>,
    ) -> Self {
        Self {
            normalizer,
            merger,
            hybrid,
            generator,
            auditor,
            limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }

    /// Answer one query for an optional company scope.
    ///
    /// The store lock is held only for the synchronous retrieval merge;
    /// embedding and generation calls run without it.
    pub async fn chat(
        &self,
        db: &Mutex<Database>,
        query: &str,
        company_slug: Option<&str>,
        previous_turn: Option<&str>,
    ) -> ChatResponse {
        // Merge once here so retrieval, detection and generation all see
        // the combined turn, not just the follow-up fragment
        let merged = QueryNormalizer::merge_follow_up(query, previous_turn);
        let normalized = self.normalizer.normalize(&merged, company_slug, None).await;
        tracing::info!(intent = %normalized.intent, company = ?company_slug, "query normalized");

        let search_text = ResultMerger::search_text(&merged, &normalized);
        let query_embedding = match self.merger.embed(&search_text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("query embedding failed, similarity stage skipped: {}", e);
                None
            }
        };

        let year = chrono::Utc::now().year();
        let fragments = {
            let db = db.lock().await;
            self.merger.retrieve(
                &db,
                &merged,
                &normalized,
                company_slug,
                Some(year),
                self.limit,
                query_embedding.as_deref(),
            )
        };

        if fragments.is_empty() {
            return ChatResponse {
                answer: crate::answer::NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                calculation: None,
                audit: None,
            };
        }

        let calculation = self.try_calculate(&merged, &fragments).await;
        let answer = self
            .generator
            .generate(&merged, normalized.intent, &fragments)
            .await;

        let audit = match &self.auditor {
            Some(auditor) => {
                let context = build_context(&merged, normalized.intent, &fragments);
                Some(auditor.audit(&merged, &context, &answer).await)
            }
            None => None,
        };

        ChatResponse {
            sources: fragments.iter().map(summarize).collect(),
            answer,
            calculation,
            audit,
        }
    }

    /// Run the hybrid calculator when the query asks for numbers. A failed
    /// calculation is logged and omitted; the textual answer still goes out.
    async fn try_calculate(
        &self,
        query: &str,
        fragments: &[RetrievedFragment],
    ) -> Option<CalculationOutcome> {
        let kind = detect(query);
        if kind == CalculationKind::None {
            return None;
        }

        // Prefer an authoritative table fragment; fall back to the head of
        // the merged list
        let candidate = fragments
            .iter()
            .find(|f| f.fragment.metadata.fragment_type == FragmentType::Table)
            .or_else(|| fragments.first())?;

        match self
            .hybrid
            .calculate(&candidate.fragment.content, query, kind)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(failure) => {
                tracing::warn!(reason = %failure.reason, "calculation not produced");
                None
            }
        }
    }
}

fn summarize(item: &RetrievedFragment) -> SourceSummary {
    SourceSummary {
        id: item.fragment.id,
        document_title: item.fragment.document_title.clone(),
        article_ref: item.fragment.article_ref.clone(),
        company: item.fragment.metadata.company.clone(),
        score: item.score,
    }
}
