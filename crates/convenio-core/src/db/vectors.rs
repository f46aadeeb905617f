//! Embedding storage operations
//!
//! Stores embeddings as BLOBs and computes cosine similarity in Rust.

use super::Database;
use crate::error::Result;
use chrono::Utc;
use rusqlite::params;

impl Database {
    /// Insert or replace the embedding for a fragment
    pub fn insert_embedding(&self, fragment_id: i64, model: &str, embedding: &[f32]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO fragment_embeddings (fragment_id, embedding, model, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![fragment_id, embedding_to_bytes(embedding), model, now],
        )?;
        Ok(())
    }

    /// Get embeddings for fragments belonging to a company or the generic
    /// corpus, for similarity search.
    pub fn embeddings_for_company(&self, company: Option<&str>) -> Result<Vec<(i64, Vec<f32>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.fragment_id, e.embedding
             FROM fragment_embeddings e
             JOIN fragments f ON f.id = e.fragment_id
             WHERE f.company = ?1 OR f.company = ?2
             ORDER BY e.fragment_id",
        )?;

        let company = company.unwrap_or(crate::companies::GENERIC_COMPANY);
        let results = stmt
            .query_map(
                params![company, crate::companies::GENERIC_COMPANY],
                |row| {
                    let id: i64 = row.get(0)?;
                    let bytes: Vec<u8> = row.get(1)?;
                    Ok((id, bytes_to_embedding(&bytes)))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }
}

/// Serialize f32 slice to little-endian bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserialize little-endian bytes to f32 vector
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_roundtrip() {
        let embedding = vec![0.1f32, -0.5, 2.25, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes_to_embedding(&bytes), embedding);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0f32, 0.0];
        let b = vec![1.0f32, 0.0];
        let c = vec![0.0f32, 1.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[]), 0.0);
    }
}
