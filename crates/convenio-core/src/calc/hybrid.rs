//! Hybrid extraction: model reads the table, local code does the math
//!
//! The generative model is only ever asked *which numbers appear* for two
//! named levels in one retrieved table fragment. Level resolution, number
//! normalization, difference and percentage arithmetic, and the guardrail
//! re-check are all local. A model response that is missing a key, wrongly
//! typed, or non-positive produces a descriptive failure, never a guessed
//! number.

use super::levels::{levels_in_text, nearest_lower_level};
use crate::calc::detector::CalculationKind;
use crate::calc::engine::round2;
use crate::llm::{ChatMessage, GenerativeClient};
use serde::Serialize;
use std::sync::Arc;

/// Salary concept keyword map; first match wins, default is base salary
const CONCEPT_KEYWORDS: &[(&str, &str)] = &[
    ("transporte", "plus de transporte"),
    ("antigüedad", "plus de antigüedad"),
    ("antiguedad", "plus de antigüedad"),
    ("nocturnidad", "plus de nocturnidad"),
    ("nocturno", "plus de nocturnidad"),
    ("festivo", "plus de festivos"),
    ("madrugue", "plus de madrugue"),
    ("hora extra", "valor hora extra"),
    ("horas extra", "valor hora extra"),
];

const DEFAULT_CONCEPT: &str = "salario base anual";

/// Percentage tolerance for the guardrail re-check
const GUARDRAIL_TOLERANCE: f64 = 0.01;

/// Swing beyond this is suspicious enough to log, not enough to reject
const SWING_WARN_PERCENTAGE: f64 = 200.0;

/// A validated numeric comparison between two levels
#[derive(Debug, Clone, Serialize)]
pub struct CalculationOutcome {
    pub concept: String,
    pub origin_level: u32,
    pub destination_level: u32,
    pub origin_value: f64,
    pub destination_value: f64,
    pub difference: f64,
    pub percentage: f64,
    pub is_simple_lookup: bool,
}

/// Why a calculation could not be produced; returned, never raised
#[derive(Debug, Clone, Serialize)]
pub struct CalculationFailure {
    pub reason: String,
}

impl CalculationFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type CalculationResult = std::result::Result<CalculationOutcome, CalculationFailure>;

/// Extracts two table values through the model and validates them locally
pub struct HybridExtractionCalculator {
    client: Arc<dyn GenerativeClient>,
}

impl HybridExtractionCalculator {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    /// Compare two levels named by `query` against one table fragment.
    pub async fn calculate(
        &self,
        fragment_content: &str,
        query: &str,
        kind: CalculationKind,
    ) -> CalculationResult {
        let fragment_levels = levels_in_text(fragment_content);
        if fragment_levels.is_empty() {
            return Err(CalculationFailure::new(
                "el fragmento recuperado no contiene niveles salariales",
            ));
        }

        let query_levels = levels_in_text(query);
        let (origin, destination, is_simple_lookup) =
            resolve_levels(&query_levels, &fragment_levels, kind)?;

        for level in [origin, destination] {
            if !fragment_levels.contains(&level) {
                return Err(CalculationFailure::new(format!(
                    "el nivel {} no aparece en la tabla recuperada",
                    level
                )));
            }
        }

        let concept = detect_concept(query);

        // Exactly one model call, JSON-forced, facts only
        let extraction = self
            .extract_values(fragment_content, origin, destination, concept)
            .await?;
        let (origin_value, destination_value) = extraction;

        let difference = destination_value - origin_value;
        let percentage = (difference / origin_value) * 100.0;

        validate_guardrail(origin_value, destination_value, difference, percentage)?;

        Ok(CalculationOutcome {
            concept: concept.to_string(),
            origin_level: origin,
            destination_level: destination,
            origin_value: round2(origin_value),
            destination_value: round2(destination_value),
            difference: round2(difference),
            percentage: round2(percentage),
            is_simple_lookup,
        })
    }

    async fn extract_values(
        &self,
        fragment: &str,
        origin: u32,
        destination: u32,
        concept: &str,
    ) -> std::result::Result<(f64, f64), CalculationFailure> {
        let origin_key = format!("valor_nivel_{}", origin);
        let destination_key = format!("valor_nivel_{}", destination);

        let system = ChatMessage::system(
            "Eres un extractor de datos de tablas salariales. Devuelve \
             únicamente un objeto JSON con los valores solicitados tal y \
             como aparecen en la tabla. No calcules nada.",
        );
        let user = ChatMessage::user(format!(
            "Tabla:\n{}\n\nExtrae el valor de \"{}\" para el nivel {} y el \
             nivel {}. Responde exactamente con este JSON:\n\
             {{\"{}\": <valor>, \"{}\": <valor>}}",
            fragment, concept, origin, destination, origin_key, destination_key
        ));

        let value = self
            .client
            .json_completion(vec![system, user])
            .await
            .map_err(|e| {
                tracing::warn!("extraction call failed: {}", e);
                CalculationFailure::new("el servicio de extracción no respondió")
            })?;

        let origin_value = read_positive_number(&value, &origin_key)?;
        let destination_value = read_positive_number(&value, &destination_key)?;
        Ok((origin_value, destination_value))
    }
}

/// Map the query to (origin, destination, is_simple_lookup)
fn resolve_levels(
    query_levels: &[u32],
    fragment_levels: &[u32],
    kind: CalculationKind,
) -> std::result::Result<(u32, u32, bool), CalculationFailure> {
    match query_levels {
        [] => Err(CalculationFailure::new(
            "la consulta no menciona ningún nivel",
        )),
        [single] => {
            if kind == CalculationKind::SimpleLookup {
                return Ok((*single, *single, true));
            }
            // One level named in a comparison: infer origin as the nearest
            // lower level available in the table
            match nearest_lower_level(*single, fragment_levels) {
                Some(origin) => Ok((origin, *single, false)),
                None => Err(CalculationFailure::new(format!(
                    "no hay nivel inferior al {} en la tabla para comparar",
                    single
                ))),
            }
        }
        [origin, destination, ..] => Ok((*origin, *destination, false)),
    }
}

fn detect_concept(query: &str) -> &'static str {
    let q = query.to_lowercase();
    CONCEPT_KEYWORDS
        .iter()
        .find(|(keyword, _)| q.contains(keyword))
        .map(|(_, concept)| *concept)
        .unwrap_or(DEFAULT_CONCEPT)
}

/// Read one key as a positive number, or explain why it cannot be used
fn read_positive_number(
    value: &serde_json::Value,
    key: &str,
) -> std::result::Result<f64, CalculationFailure> {
    let raw = value
        .get(key)
        .ok_or_else(|| CalculationFailure::new(format!("falta el campo \"{}\"", key)))?;

    let number = normalize_number(raw).ok_or_else(|| {
        CalculationFailure::new(format!("el campo \"{}\" no es un número válido", key))
    })?;

    if number <= 0.0 {
        return Err(CalculationFailure::new(format!(
            "el campo \"{}\" no es un importe positivo",
            key
        )));
    }
    Ok(number)
}

/// Recompute and compare; positive values are already guaranteed upstream
fn validate_guardrail(
    origin: f64,
    destination: f64,
    difference: f64,
    percentage: f64,
) -> std::result::Result<(), CalculationFailure> {
    let recomputed_difference = destination - origin;
    let recomputed_percentage = (recomputed_difference / origin) * 100.0;

    if (recomputed_difference - difference).abs() > GUARDRAIL_TOLERANCE
        || (recomputed_percentage - percentage).abs() > GUARDRAIL_TOLERANCE
    {
        return Err(CalculationFailure::new(
            "la verificación aritmética no cuadra",
        ));
    }

    if percentage.abs() > SWING_WARN_PERCENTAGE {
        tracing::warn!(
            origin,
            destination,
            percentage,
            "unusually large swing between levels"
        );
    }
    Ok(())
}

/// Parse a model-supplied value into f64, accepting JSON numbers and
/// strings with European separators ("25.000,00") or currency symbols.
pub fn normalize_number(value: &serde_json::Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let text = value.as_str()?;
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let normalized = if has_dot && has_comma {
        // The last separator is the decimal one
        if cleaned.rfind('.') > cleaned.rfind(',') {
            cleaned.replace(',', "")
        } else {
            cleaned.replace('.', "").replace(',', ".")
        }
    } else if has_comma {
        cleaned.replace(',', ".")
    } else if has_dot && looks_like_thousand_grouping(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok()
}

/// "25.000" or "1.234.567" style: every dot-separated tail group is 3 digits
fn looks_like_thousand_grouping(text: &str) -> bool {
    let mut parts = text.split('.');
    let Some(head) = parts.next() else {
        return false;
    };
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut any_group = false;
    for group in parts {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        any_group = true;
    }
    any_group
}
