//! Calculation trigger detection
//!
//! The rule is deliberately conjunctive: an operation keyword alone (as in
//! "diferencia entre vacaciones y permisos") must not route a text question
//! into the numeric path.

use super::levels::levels_in_text;
use lazy_static::lazy_static;
use regex::Regex;

/// What kind of numeric handling a query needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationKind {
    /// No computation: generic answer path
    None,
    /// One level named with lookup phrasing ("cuánto cobra nivel 4")
    SimpleLookup,
    /// Explicit two-level comparison
    Comparison,
}

const OPERATION_KEYWORDS: &[&str] = &[
    "diferencia",
    "cuanto más",
    "cuánto más",
    "cuanto menos",
    "cuánto menos",
    "incremento",
    "aumento",
    "reducción",
    "comparar",
    "vs",
    "versus",
    "calcular",
    "calcula",
];

const SALARY_CONTEXT_KEYWORDS: &[&str] = &[
    "nivel",
    "grupo",
    "salario",
    "sueldo",
    "cobrar",
    "cobra",
    "paga",
    "plus",
    "retribución",
    "bruto",
    "neto",
    "anual",
    "mensual",
];

const LOOKUP_PHRASES: &[&str] = &["cuánto cobra", "cuanto cobra", "cuánto gana", "cuanto gana", "qué cobra", "que cobra"];

lazy_static! {
    /// "nivel 3 y 4", "nivel 3 vs nivel 4", "nivel III y IV"
    static ref TWO_LEVEL_PATTERN: Regex = Regex::new(
        r"(?i)niv(?:el)?\.?\s*(?:\d{1,2}|[ivx]{1,4})\s*(?:y|e|o|vs\.?|versus|contra|-|al?)\s*(?:niv(?:el)?\.?\s*)?(?:\d{1,2}|[ivx]{1,4})\b"
    )
    .unwrap();
}

/// Decide whether a query requires numeric computation.
pub fn detect(query: &str) -> CalculationKind {
    let q = query.to_lowercase();

    let has_operation = OPERATION_KEYWORDS.iter().any(|kw| q.contains(kw));
    let has_context = SALARY_CONTEXT_KEYWORDS.iter().any(|kw| q.contains(kw));
    let has_digit = q.chars().any(|c| c.is_ascii_digit());
    let has_two_levels = TWO_LEVEL_PATTERN.is_match(&q) && levels_in_text(&q).len() >= 2;

    if has_operation && (has_context || has_digit) && has_two_levels {
        return CalculationKind::Comparison;
    }

    // Single named level with lookup phrasing: handled as a value lookup,
    // not a comparison
    if levels_in_text(&q).len() == 1 && LOOKUP_PHRASES.iter().any(|p| q.contains(p)) {
        return CalculationKind::SimpleLookup;
    }

    CalculationKind::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_comparison_detected() {
        assert_eq!(detect("diferencia salarial nivel 3 y 4"), CalculationKind::Comparison);
        assert_eq!(
            detect("comparar salario nivel 2 vs nivel 3"),
            CalculationKind::Comparison
        );
        assert_eq!(
            detect("calcular diferencia nivel 3 y nivel 4"),
            CalculationKind::Comparison
        );
        assert_eq!(detect("incremento del nivel II al III"), CalculationKind::Comparison);
    }

    #[test]
    fn test_single_level_is_lookup_not_comparison() {
        assert_eq!(detect("cuánto cobra nivel 4"), CalculationKind::SimpleLookup);
        assert_eq!(detect("cuanto gana un nivel 2"), CalculationKind::SimpleLookup);
    }

    #[test]
    fn test_operation_without_salary_context_suppressed() {
        // operation keyword present, no salary context, no two-level pattern
        assert_eq!(
            detect("diferencia entre vacaciones y permisos"),
            CalculationKind::None
        );
        assert_eq!(detect("incremento de vacaciones"), CalculationKind::None);
    }

    #[test]
    fn test_no_operation_keyword() {
        assert_eq!(detect("cuales son las vacaciones"), CalculationKind::None);
        assert_eq!(detect("salario base"), CalculationKind::None);
        assert_eq!(detect("nivel 3"), CalculationKind::None);
    }

    #[test]
    fn test_operation_and_context_but_single_level() {
        // "aumento de sueldo nivel 5": no second level, so no comparison
        assert_eq!(detect("aumento de sueldo nivel 5"), CalculationKind::None);
    }
}
