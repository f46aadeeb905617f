//! Result merging: deterministic injections over a similarity safety net
//!
//! Exact citations and authoritative tables must always outrank
//! similarity-ranked results; vector search exists purely as recall
//! filler. Stages run in strict order, feeding one list guarded by a
//! seen-id set so a fragment matching several injection rules appears
//! exactly once.

use crate::db::Database;
use crate::intent::Intent;
use crate::model::LegalFragment;
use crate::query::NormalizedQuery;
use crate::retrieval::{AnchorRetriever, VectorRetriever};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    /// "art. 45", "artículo 45", "articulo 45"
    static ref ARTICLE_REF: Regex = Regex::new(r"(?i)art(?:[íi]culo)?\.?\s*(\d{1,3})").unwrap();
}

/// Which stage produced a retrieved fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    ArticleRef,
    ForcedTable,
    Anchor,
    Similarity,
}

/// A fragment with its retrieval provenance and similarity score.
/// Deterministic stages carry a zero distance: they are authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedFragment {
    pub fragment: LegalFragment,
    pub score: f32,
    pub source: RetrievalSource,
}

// "salari" covers salario/salarial/salarios
const SALARY_HEURISTIC_KEYWORDS: &[&str] = &[
    "salari", "sueldo", "nómina", "cobr", "tabla", "plus", "retribución", "bruto", "neto",
];

/// Combines anchor, forced, and vector results into one ordered list
pub struct ResultMerger {
    anchors: Arc<AnchorRetriever>,
    vector: Arc<VectorRetriever>,
}

impl ResultMerger {
    pub fn new(anchors: Arc<AnchorRetriever>, vector: Arc<VectorRetriever>) -> Self {
        Self { anchors, vector }
    }

    /// Text fed to the similarity stage: expansion keywords when present,
    /// otherwise the raw query.
    pub fn search_text(raw_query: &str, normalized: &NormalizedQuery) -> String {
        if normalized.search_keywords.is_empty() {
            raw_query.to_string()
        } else {
            normalized.search_keywords.join(" ")
        }
    }

    /// Embed the similarity-stage text. Kept separate from `retrieve` so the
    /// store is never held across a network call.
    pub async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
        self.vector.embed_query(text).await
    }

    /// Run the full retrieval merge. Never errors: failed stages are logged
    /// and skipped, the remaining stages still run. Passing no query
    /// embedding skips the similarity stage.
    pub fn retrieve(
        &self,
        db: &Database,
        raw_query: &str,
        normalized: &NormalizedQuery,
        company_slug: Option<&str>,
        year: Option<i32>,
        limit: usize,
        query_embedding: Option<&[f32]>,
    ) -> Vec<RetrievedFragment> {
        let mut results: Vec<RetrievedFragment> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let q = raw_query.to_lowercase();

        // 1. Explicit article citation: targeted lookup, force-prepended
        if let Some(article_number) = extract_article_number(raw_query) {
            let statute_only = q.contains("estatuto");
            match db.fragments_by_article(&article_number, statute_only, company_slug, limit) {
                Ok(fragments) => {
                    tracing::info!(
                        article = %article_number,
                        statute_only,
                        count = fragments.len(),
                        "explicit article lookup"
                    );
                    append_unique(&mut results, &mut seen, fragments, RetrievalSource::ArticleRef);
                }
                Err(e) => tracing::error!("article lookup failed: {}", e),
            }
        }

        // 2. Salary heuristics with a known company: force annex/table refs
        if let Some(company) = company_slug {
            if matches_salary_heuristics(&q) {
                let include_pmr = q.contains("movilidad reducida") || q.contains("pmr");
                match db.annex_fragments(company, include_pmr, limit) {
                    Ok(fragments) => {
                        append_unique(
                            &mut results,
                            &mut seen,
                            fragments,
                            RetrievalSource::ForcedTable,
                        );
                    }
                    Err(e) => tracing::error!("annex lookup failed: {}", e),
                }
            }
        }

        // 3. Structured-data intents get anchors at the front, in anchor order
        if normalized.needs_structured_data && normalized.intent != Intent::General {
            let anchors = self
                .anchors
                .fetch(db, normalized.intent, company_slug, year, limit);
            prepend_unique(&mut results, &mut seen, anchors, RetrievalSource::Anchor);
        }

        // 4. Similarity search as fallback filler
        if let Some(embedding) = query_embedding {
            match self.vector.rank(db, embedding, company_slug, limit) {
                Ok(scored) => {
                    for item in scored {
                        if seen.insert(item.fragment.id) {
                            results.push(RetrievedFragment {
                                fragment: item.fragment,
                                score: item.score,
                                source: RetrievalSource::Similarity,
                            });
                        }
                    }
                }
                Err(e) => tracing::warn!("similarity stage degraded to empty: {}", e),
            }
        }

        // 5. Truncate
        results.truncate(limit);
        results
    }
}

fn matches_salary_heuristics(query: &str) -> bool {
    SALARY_HEURISTIC_KEYWORDS.iter().any(|kw| query.contains(kw))
}

fn extract_article_number(query: &str) -> Option<String> {
    ARTICLE_REF
        .captures(query)
        .map(|caps| caps[1].to_string())
}

fn append_unique(
    results: &mut Vec<RetrievedFragment>,
    seen: &mut HashSet<i64>,
    fragments: Vec<LegalFragment>,
    source: RetrievalSource,
) {
    for fragment in fragments {
        if seen.insert(fragment.id) {
            results.push(RetrievedFragment {
                fragment,
                score: 0.0,
                source,
            });
        }
    }
}

fn prepend_unique(
    results: &mut Vec<RetrievedFragment>,
    seen: &mut HashSet<i64>,
    fragments: Vec<LegalFragment>,
    source: RetrievalSource,
) {
    let mut front: Vec<RetrievedFragment> = Vec::new();
    for fragment in fragments {
        if seen.insert(fragment.id) {
            front.push(RetrievedFragment {
                fragment,
                score: 0.0,
                source,
            });
        }
    }
    front.append(results);
    *results = front;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_article_number() {
        assert_eq!(extract_article_number("qué dice el artículo 45"), Some("45".into()));
        assert_eq!(extract_article_number("Art. 37 del estatuto"), Some("37".into()));
        assert_eq!(extract_article_number("articulo 8"), Some("8".into()));
        assert_eq!(extract_article_number("cuánto cobro"), None);
    }

    #[test]
    fn test_salary_heuristics() {
        assert!(matches_salary_heuristics("cuánto cobra un nivel 3"));
        assert!(matches_salary_heuristics("tabla de pluses"));
        assert!(!matches_salary_heuristics("días de permiso por boda"));
    }
}
