//! Embedding similarity search over legal fragments
//!
//! Ranks company-or-generic fragments by cosine distance to the query
//! embedding. Used as the recall safety net behind the deterministic
//! retrieval stages.

use crate::db::{cosine_similarity, Database};
use crate::error::Result;
use crate::llm::Embedder;
use crate::model::ScoredFragment;
use std::sync::Arc;

/// Nearest-neighbor fragment search
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed a query text. Split out from ranking so callers never hold a
    /// store handle across this network call.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text).await
    }

    /// Rank stored fragments by ascending cosine distance to an embedding.
    /// Ties keep insertion order (stable sort over id-ordered rows).
    pub fn rank(
        &self,
        db: &Database,
        query_embedding: &[f32],
        company_slug: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ScoredFragment>> {
        let stored = db.embeddings_for_company(company_slug)?;

        let mut distances: Vec<(i64, f32)> = stored
            .iter()
            .map(|(id, embedding)| {
                let distance = 1.0 - cosine_similarity(query_embedding, embedding);
                (*id, distance)
            })
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut results = Vec::with_capacity(limit.min(distances.len()));
        for (id, distance) in distances.into_iter().take(limit) {
            if let Some(fragment) = db.get_fragment(id)? {
                results.push(ScoredFragment {
                    fragment,
                    score: distance,
                });
            }
        }

        Ok(results)
    }

    /// Convenience: embed then rank in one call. Callers that hold a store
    /// lock should use `embed_query` + `rank` instead.
    pub async fn search(
        &self,
        db: &Database,
        text: &str,
        company_slug: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ScoredFragment>> {
        let embedding = self.embed_query(text).await?;
        self.rank(db, &embedding, company_slug, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FragmentInsert;
    use crate::intent::Intent;
    use crate::llm::Embedder;
    use crate::model::FragmentType;
    use async_trait::async_trait;

    /// Embedder that maps known phrases to fixed unit vectors
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("vacaciones") {
                Ok(vec![1.0, 0.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0, 0.0])
            }
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_closest_fragment_ranks_first() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let doc = db.insert_document("Convenio", "Convenio", "azul").unwrap();

        let vacation_id = db
            .insert_fragment(&FragmentInsert {
                document_id: doc,
                content: "Las vacaciones anuales serán de 30 días naturales",
                article_ref: Some("Art. 20"),
                company: "azul",
                intents: &[Intent::Leave],
                fragment_type: FragmentType::Article,
                year: 2025,
                version_fingerprint: "fp-1",
                is_primary: false,
            })
            .unwrap();
        let salary_id = db
            .insert_fragment(&FragmentInsert {
                document_id: doc,
                content: "Plus de transporte mensual",
                article_ref: Some("Art. 31"),
                company: "azul",
                intents: &[Intent::Salary],
                fragment_type: FragmentType::Text,
                year: 2025,
                version_fingerprint: "fp-1",
                is_primary: false,
            })
            .unwrap();

        db.insert_embedding(vacation_id, "stub", &[1.0, 0.0, 0.0]).unwrap();
        db.insert_embedding(salary_id, "stub", &[0.0, 1.0, 0.0]).unwrap();

        let retriever = VectorRetriever::new(Arc::new(StubEmbedder));
        let results = retriever
            .search(&db, "cuántas vacaciones tengo", Some("azul"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fragment.id, vacation_id);
        assert!(results[0].score < results[1].score);
    }

    #[tokio::test]
    async fn test_company_filter_includes_generic() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let doc = db.insert_document("Estatuto", "Estatuto", "general").unwrap();

        let generic_id = db
            .insert_fragment(&FragmentInsert {
                document_id: doc,
                content: "Derechos básicos del trabajador",
                article_ref: Some("Art. 4"),
                company: "general",
                intents: &[Intent::General],
                fragment_type: FragmentType::Article,
                year: 2025,
                version_fingerprint: "fp-1",
                is_primary: false,
            })
            .unwrap();
        db.insert_embedding(generic_id, "stub", &[0.0, 1.0, 0.0]).unwrap();

        let retriever = VectorRetriever::new(Arc::new(StubEmbedder));
        let results = retriever
            .search(&db, "derechos", Some("iberia"), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fragment.id, generic_id);
    }
}
