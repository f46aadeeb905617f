//! Kinship degree reference data
//!
//! The consanguinity/affinity table is injected verbatim into LEAVE prompts
//! so the model cannot improvise degrees of kinship.

/// (degree, blood relatives, in-law relatives)
pub const KINSHIP_TABLE: &[(u8, &str, &str)] = &[
    (1, "Padres, Hijos", "Suegros, Yernos, Nueras, Hijastros"),
    (
        2,
        "Hermanos, Abuelos, Nietos",
        "Cuñados, Abuelos del cónyuge, Nietos del cónyuge",
    ),
    (
        3,
        "Tíos, Sobrinos",
        "Tíos del cónyuge, Sobrinos del cónyuge",
    ),
    (4, "Primos hermanos", "Primos del cónyuge"),
];

/// Flat keyword list for fast kinship detection in queries.
pub const KINSHIP_KEYWORDS: &[&str] = &[
    "padre", "madre", "papá", "mamá", "hijo", "hija", "hermano", "hermana", "abuelo", "abuela",
    "nieto", "nieta", "tío", "tía", "sobrino", "sobrina", "primo", "prima", "suegro", "suegra",
    "yerno", "nuera", "hijastro", "hijastra", "cuñado", "cuñada", "cónyuge", "pareja", "marido",
    "mujer", "esposo", "esposa", "familiar", "pariente", "grado", "consanguinidad", "afinidad",
];

/// Render the kinship table as a markdown block for prompt injection.
pub fn kinship_table_markdown() -> String {
    let mut md = String::from(
        "### TABLA OFICIAL DE GRADOS DE PARENTESCO (CONSULTAR OBLIGATORIAMENTE)\n\n\
         | GRADO | CONSANGUINIDAD (Sangre) | AFINIDAD (Político/Cónyuge) |\n\
         |-------|-------------------------|------------------------------|\n",
    );
    for (degree, blood, affinity) in KINSHIP_TABLE {
        md.push_str(&format!("| **{}º** | {} | {} |\n", degree, blood, affinity));
    }
    md
}

/// True when the query names a relative or kinship concept.
pub fn mentions_kinship(query: &str) -> bool {
    let q = query.to_lowercase();
    KINSHIP_KEYWORDS.iter().any(|kw| q.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_kinship() {
        assert!(mentions_kinship("mi tío está ingresado"));
        assert!(mentions_kinship("permiso por cuñada"));
        assert!(!mentions_kinship("cuánto cobro de plus transporte"));
    }

    #[test]
    fn test_markdown_contains_all_degrees() {
        let md = kinship_table_markdown();
        for degree in 1..=4 {
            assert!(md.contains(&format!("**{}º**", degree)));
        }
    }
}
