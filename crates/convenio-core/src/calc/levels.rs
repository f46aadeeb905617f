//! Level-number extraction from queries and table fragments
//!
//! Levels appear as arabic digits ("nivel 3") or roman numerals up to X
//! ("Nivel III"). All extraction is local string work; no model involved.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEVEL_TOKEN: Regex =
        Regex::new(r"(?i)niv(?:el)?\.?\s*(\d{1,2}|[ivx]{1,4})\b").unwrap();
    /// "nivel 3 y 4": the second number rides on the comparison connective
    /// without repeating the "nivel" prefix
    static ref LEVEL_CONTINUATION: Regex = Regex::new(
        r"(?i)niv(?:el)?\.?\s*(?:\d{1,2}|[ivx]{1,4})\s*(?:y|e|o|vs\.?|versus|contra|-|al?)\s*(\d{1,2}|[ivx]{1,4})\b"
    )
    .unwrap();
    static ref ENTRY_LEVEL: Regex = Regex::new(r"(?i)nivel\s+(?:de\s+)?entrada").unwrap();
}

/// Parse one level token: "3" or a roman numeral I..X
pub fn parse_level_token(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return if (1..=20).contains(&n) { Some(n) } else { None };
    }
    roman_to_u32(token)
}

/// Roman numerals I through X
fn roman_to_u32(token: &str) -> Option<u32> {
    match token.to_uppercase().as_str() {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        "VI" => Some(6),
        "VII" => Some(7),
        "VIII" => Some(8),
        "IX" => Some(9),
        "X" => Some(10),
        _ => None,
    }
}

/// All level numbers named in a text, in order of appearance, deduplicated.
/// "Nivel entrada" counts as level 1.
pub fn levels_in_text(text: &str) -> Vec<u32> {
    // (byte offset, level) so tokens from the two patterns interleave in
    // document order
    let mut found: Vec<(usize, u32)> = Vec::new();

    for caps in LEVEL_TOKEN.captures_iter(text) {
        let m = caps.get(1).unwrap();
        if let Some(level) = parse_level_token(m.as_str()) {
            found.push((m.start(), level));
        }
    }
    for caps in LEVEL_CONTINUATION.captures_iter(text) {
        let m = caps.get(1).unwrap();
        if let Some(level) = parse_level_token(m.as_str()) {
            found.push((m.start(), level));
        }
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut levels = Vec::new();
    if ENTRY_LEVEL.is_match(text) {
        levels.push(1);
    }
    for (_, level) in found {
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    levels
}

/// Nearest available level strictly below `level`, falling back to the
/// lowest available level (the base of the table).
pub fn nearest_lower_level(level: u32, available: &[u32]) -> Option<u32> {
    let mut lower: Vec<u32> = available.iter().copied().filter(|&l| l < level).collect();
    if lower.is_empty() {
        available.iter().copied().min().filter(|&l| l != level)
    } else {
        lower.sort_unstable();
        lower.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_levels() {
        assert_eq!(levels_in_text("diferencia nivel 3 y nivel 4"), vec![3, 4]);
        assert_eq!(levels_in_text("cuánto cobra nivel 5"), vec![5]);
    }

    #[test]
    fn test_roman_levels() {
        assert_eq!(levels_in_text("Nivel III frente a Nivel IV"), vec![3, 4]);
        assert_eq!(parse_level_token("VIII"), Some(8));
        assert_eq!(parse_level_token("XI"), None);
    }

    #[test]
    fn test_entry_level() {
        assert_eq!(levels_in_text("Nivel entrada: 18.450,87"), vec![1]);
    }

    #[test]
    fn test_dedup_preserves_order() {
        assert_eq!(levels_in_text("nivel 4, nivel 2, nivel 4"), vec![4, 2]);
    }

    #[test]
    fn test_nearest_lower_level() {
        assert_eq!(nearest_lower_level(4, &[1, 2, 3, 4, 5]), Some(3));
        assert_eq!(nearest_lower_level(5, &[1, 2, 3]), Some(3));
        // no strictly-lower level: fall back to the table base
        assert_eq!(nearest_lower_level(1, &[1, 2, 3]), None);
        assert_eq!(nearest_lower_level(1, &[2, 3]), Some(2));
    }
}
