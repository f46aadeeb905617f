//! Query normalization: intent classification and keyword expansion
//!
//! Heuristics run first; the generative service is only consulted when no
//! fast-path rule matches. Normalization never fails: every error path
//! degrades to a GENERAL classification of the original query.

use crate::intent::Intent;
use crate::kinship;
use crate::llm::{ChatMessage, GenerativeClient};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Where a normalization came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationSource {
    Heuristic,
    Model,
    Fallback,
}

/// Normalized form of a user query
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedQuery {
    pub intent: Intent,
    pub search_keywords: Vec<String>,
    pub needs_structured_data: bool,
    pub source: NormalizationSource,
}

/// One intent-classification rule: first match wins, top to bottom.
struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
    /// Search-term enrichment contributed when this rule fires
    expansion: &'static [&'static str],
    /// Only fires when a company slug accompanies the query
    requires_company: bool,
}

/// Ordered rule list. Precedence: DISMISSAL > LEAVE > SALARY >
/// profile-override > GENERAL (the implicit tail).
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Dismissal,
        keywords: &[
            "despido", "despedir", "finiquito", "sanción", "sancionado", "sancionada",
            "indemnización", "extinción del contrato", "falta grave",
        ],
        expansion: &[
            "régimen disciplinario", "indemnización por despido", "liquidación de haberes",
        ],
        requires_company: false,
    },
    IntentRule {
        intent: Intent::Leave,
        keywords: &[
            "vacaciones", "permiso", "licencia", "excedencia", "días libres",
            "baja", "hospitalización", "parentesco", "asuntos propios",
        ],
        expansion: &["permisos retribuidos", "licencias retribuidas", "grados de parentesco"],
        requires_company: false,
    },
    IntentRule {
        intent: Intent::Salary,
        keywords: &[
            "salario", "sueldo", "nómina", "cobro", "cobrar", "cobra", "retribución",
            "plus", "pluses", "hora extra", "horas extra", "nocturnidad", "paga",
            "tabla salarial", "bruto", "neto",
        ],
        expansion: &["tabla salarial", "retribución bruta anual", "grupo profesional"],
        requires_company: false,
    },
    // Profile override: with a known company, level/group talk is salary
    // territory even though the words alone would classify GENERAL.
    IntentRule {
        intent: Intent::Salary,
        keywords: &["nivel", "grupo", "categoría", "tabla", "anexo"],
        expansion: &["tabla salarial", "niveles salariales"],
        requires_company: true,
    },
];

/// Connectives that mark a short follow-up to the previous turn
const CONTINUATION_CONNECTIVES: &[&str] = &[
    "y si", "y qué", "y que", "y cuando", "y cuándo", "y en", "¿y", "pero", "entonces",
];

const MAX_KEYWORD_LEN: usize = 60;

/// Query normalizer (layer 1 of the retrieval pipeline)
pub struct QueryNormalizer {
    client: Option<Arc<dyn GenerativeClient>>,
}

impl QueryNormalizer {
    pub fn new(client: Option<Arc<dyn GenerativeClient>>) -> Self {
        Self { client }
    }

    /// Merge a short follow-up query with the previous user turn.
    ///
    /// Pure string operation, run before any generative call so a cheap
    /// heuristic saves a model round-trip.
    pub fn merge_follow_up(query: &str, previous_turn: Option<&str>) -> String {
        let trimmed = query.trim();
        let lowered = trimmed.to_lowercase();
        if let Some(previous) = previous_turn {
            let is_continuation = CONTINUATION_CONNECTIVES
                .iter()
                .any(|c| lowered.starts_with(c));
            if is_continuation && !previous.trim().is_empty() {
                return format!("{} {}", previous.trim(), trimmed);
            }
        }
        trimmed.to_string()
    }

    /// Normalize a query. Never returns an error: every failure degrades to
    /// a GENERAL classification of the original query.
    pub async fn normalize(
        &self,
        query: &str,
        company_slug: Option<&str>,
        previous_turn: Option<&str>,
    ) -> NormalizedQuery {
        let merged = Self::merge_follow_up(query, previous_turn);

        if let Some(result) = classify_by_rules(&merged, company_slug) {
            tracing::debug!(
                intent = %result.intent,
                keywords = result.search_keywords.len(),
                "query classified by heuristic rule"
            );
            return result;
        }

        if let Some(client) = &self.client {
            match self.normalize_with_model(client.as_ref(), &merged).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!("model normalization failed, using fallback: {}", e);
                }
            }
        }

        fallback_normalization(&merged)
    }

    async fn normalize_with_model(
        &self,
        client: &dyn GenerativeClient,
        query: &str,
    ) -> Result<NormalizedQuery> {
        let messages = vec![
            ChatMessage::system(
                "Actúas como middleware de búsqueda jurídica para un sistema de handling \
                 aeroportuario en España. Clasifica la consulta y genera términos de búsqueda. \
                 Devuelve SOLO un JSON con los campos: \
                 intent (SALARY | LEAVE | DISMISSAL | GENERAL), \
                 keywords (lista de 3-5 términos jurídicos sinónimos), \
                 needs_tables (boolean: true si la pregunta implica valores numéricos, \
                 salarios o grados de parentesco).",
            ),
            ChatMessage::user(format!("Consulta del usuario: \"{}\"", query)),
        ];

        let value = client.json_completion(messages).await?;

        // Model-chosen intent sanitized against the fixed enum
        let intent = value["intent"]
            .as_str()
            .and_then(Intent::parse)
            .unwrap_or(Intent::General);

        let mut keywords: Vec<String> = value["keywords"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(clean_keyword)
                    .filter(|k| !k.is_empty() && k.len() < MAX_KEYWORD_LEN)
                    .collect()
            })
            .unwrap_or_default();
        if keywords.is_empty() {
            keywords.push(clean_keyword(query));
        }

        let needs_structured_data = value["needs_tables"].as_bool().unwrap_or(false);

        tracing::info!(
            intent = %intent,
            needs_tables = needs_structured_data,
            keyword_count = keywords.len(),
            "query normalized by model"
        );

        Ok(NormalizedQuery {
            intent,
            search_keywords: keywords,
            needs_structured_data,
            source: NormalizationSource::Model,
        })
    }
}

fn classify_by_rules(query: &str, company_slug: Option<&str>) -> Option<NormalizedQuery> {
    let q = query.to_lowercase();

    for rule in INTENT_RULES {
        if rule.requires_company && company_slug.is_none() {
            continue;
        }
        if rule.keywords.iter().any(|kw| q.contains(kw)) {
            let mut keywords = vec![clean_keyword(query)];
            keywords.extend(rule.expansion.iter().map(|s| s.to_string()));

            let needs_structured_data = matches!(rule.intent, Intent::Salary)
                || kinship::mentions_kinship(&q)
                || q.chars().any(|c| c.is_ascii_digit());

            return Some(NormalizedQuery {
                intent: rule.intent,
                search_keywords: keywords,
                needs_structured_data,
                source: NormalizationSource::Heuristic,
            });
        }
    }

    None
}

fn fallback_normalization(query: &str) -> NormalizedQuery {
    NormalizedQuery {
        intent: Intent::General,
        search_keywords: vec![clean_keyword(query)],
        needs_structured_data: false,
        source: NormalizationSource::Fallback,
    }
}

/// Lowercase, trim, and strip trailing punctuation that breaks exact search
fn clean_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .trim_end_matches(['?', '.', '!', ',', ';', ':', '¿'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QueryNormalizer {
        QueryNormalizer::new(None)
    }

    #[tokio::test]
    async fn test_dismissal_beats_salary() {
        // "finiquito" and "cobrar" both appear; DISMISSAL has precedence
        let result = normalizer()
            .normalize("cuánto finiquito voy a cobrar", None, None)
            .await;
        assert_eq!(result.intent, Intent::Dismissal);
        assert_eq!(result.source, NormalizationSource::Heuristic);
    }

    #[tokio::test]
    async fn test_leave_intent() {
        let result = normalizer()
            .normalize("¿cuántos días de vacaciones me corresponden?", None, None)
            .await;
        assert_eq!(result.intent, Intent::Leave);
    }

    #[tokio::test]
    async fn test_salary_intent_needs_tables() {
        let result = normalizer()
            .normalize("tabla salarial nivel 3", Some("azul"), None)
            .await;
        assert_eq!(result.intent, Intent::Salary);
        assert!(result.needs_structured_data);
    }

    #[tokio::test]
    async fn test_profile_override_requires_company() {
        // "nivel 4" alone is GENERAL without a company profile
        let without = normalizer().normalize("qué es el nivel 4", None, None).await;
        assert_eq!(without.intent, Intent::General);

        let with = normalizer()
            .normalize("qué es el nivel 4", Some("iberia"), None)
            .await;
        assert_eq!(with.intent, Intent::Salary);
    }

    #[tokio::test]
    async fn test_fallback_is_general() {
        let result = normalizer().normalize("hola buenas tardes", None, None).await;
        assert_eq!(result.intent, Intent::General);
        assert_eq!(result.source, NormalizationSource::Fallback);
        assert_eq!(result.search_keywords, vec!["hola buenas tardes".to_string()]);
        assert!(!result.needs_structured_data);
    }

    #[test]
    fn test_follow_up_merge() {
        let merged = QueryNormalizer::merge_follow_up(
            "¿y si tengo rotación 4x4?",
            Some("cuántos días libres me tocan al mes"),
        );
        assert_eq!(
            merged,
            "cuántos días libres me tocan al mes ¿y si tengo rotación 4x4?"
        );
    }

    #[test]
    fn test_follow_up_not_merged_without_connective() {
        let merged =
            QueryNormalizer::merge_follow_up("cuánto cobro de plus", Some("días libres"));
        assert_eq!(merged, "cuánto cobro de plus");
    }

    #[test]
    fn test_clean_keyword() {
        assert_eq!(clean_keyword(" Tabla Salarial? "), "tabla salarial");
        assert_eq!(clean_keyword("permiso retribuido."), "permiso retribuido");
    }
}
