//! End-to-end pipeline tests over an in-memory store
//!
//! Tests:
//! 1. Salary comparison query produces a validated calculation object
//! 2. Injection stages never emit duplicate fragment ids
//! 3. Empty retrieval yields the fixed no-information answer

use async_trait::async_trait;
use chrono::Datelike;
use convenio_core::db::FragmentInsert;
use convenio_core::{
    AnchorRetriever, AnswerGenerator, ChatMessage, ChatPipeline, Database, Embedder,
    FragmentType, GenerativeClient, HybridExtractionCalculator, Intent, LlmServiceConfig,
    QueryNormalizer, ResultMerger, VectorRetriever, NO_INFORMATION_ANSWER,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Routes canned responses by prompt shape: extraction, normalization,
/// or free-text answer.
struct ScriptedClient;

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> convenio_core::Result<String> {
        let user = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        if user.contains("valor_nivel_") {
            return Ok(
                r#"{"valor_nivel_2": "21.850,75", "valor_nivel_3": "22.507,75"}"#.to_string(),
            );
        }
        if user.contains("Consulta del usuario") {
            return Ok(
                r#"{"intent": "SALARY", "keywords": ["tabla salarial"], "needs_tables": true}"#
                    .to_string(),
            );
        }
        Ok("Según el Anexo II, la diferencia es de 657,00 € anuales.".to_string())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> convenio_core::Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

fn build_pipeline() -> ChatPipeline {
    let client: Arc<dyn GenerativeClient> = Arc::new(ScriptedClient);
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder);

    let anchors = Arc::new(AnchorRetriever::new());
    let vector = Arc::new(VectorRetriever::new(embedder));
    let merger = ResultMerger::new(anchors, vector);

    let service = LlmServiceConfig {
        url: Some("http://llm.test".to_string()),
        ..LlmServiceConfig::default()
    };

    ChatPipeline::new(
        QueryNormalizer::new(Some(client.clone())),
        merger,
        HybridExtractionCalculator::new(client.clone()),
        AnswerGenerator::new(client, service),
        None,
    )
}

fn seed_salary_table(db: &Database) -> i64 {
    let year = chrono::Utc::now().year();
    let doc_id = db
        .insert_document("Convenio Azul Handling", "convenio", "azul")
        .unwrap();
    db.insert_fragment(&FragmentInsert {
        document_id: doc_id,
        content: "ANEXO II. Tabla salarial\n\
                  Nivel 2: 21.850,75 €\n\
                  Nivel 3: 22.507,75 €",
        article_ref: Some("Anexo II"),
        company: "azul",
        intents: &[Intent::Salary],
        fragment_type: FragmentType::Table,
        year,
        version_fingerprint: "v1",
        is_primary: true,
    })
    .unwrap()
}

#[tokio::test]
async fn test_salary_comparison_end_to_end() {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    let fragment_id = seed_salary_table(&db);
    db.insert_embedding(fragment_id, "fixed", &[1.0, 0.0, 0.0])
        .unwrap();

    let db = Mutex::new(db);
    let pipeline = build_pipeline();
    let response = pipeline
        .chat(&db, "diferencia salarial nivel 2 y 3", Some("azul"), None)
        .await;

    assert!(!response.sources.is_empty());
    assert_ne!(response.answer, NO_INFORMATION_ANSWER);

    let calc = response.calculation.expect("calculation present");
    assert_eq!(calc.origin_level, 2);
    assert_eq!(calc.destination_level, 3);
    assert!((calc.difference - (22_507.75 - 21_850.75)).abs() < 0.01);
    let expected_pct = (calc.difference / calc.origin_value) * 100.0;
    assert!((calc.percentage - expected_pct).abs() < 0.01);
}

#[tokio::test]
async fn test_follow_up_comparison_merges_previous_turn() {
    // The follow-up alone carries no operation keyword; only the merged
    // turn is a two-level comparison
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    let fragment_id = seed_salary_table(&db);
    db.insert_embedding(fragment_id, "fixed", &[1.0, 0.0, 0.0])
        .unwrap();

    let db = Mutex::new(db);
    let pipeline = build_pipeline();
    let response = pipeline
        .chat(
            &db,
            "y si comparo nivel 2 y 3",
            Some("azul"),
            Some("cuál es la diferencia salarial entre niveles"),
        )
        .await;

    assert!(!response.sources.is_empty());
    let calc = response.calculation.expect("calculation present");
    assert_eq!(calc.origin_level, 2);
    assert_eq!(calc.destination_level, 3);
}

#[tokio::test]
async fn test_no_duplicate_source_ids() {
    // The table fragment matches the annex rule, the anchor rule and the
    // similarity stage at once; it must still appear exactly once
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    let fragment_id = seed_salary_table(&db);
    db.insert_embedding(fragment_id, "fixed", &[1.0, 0.0, 0.0])
        .unwrap();

    let db = Mutex::new(db);
    let pipeline = build_pipeline();
    let response = pipeline
        .chat(&db, "tabla salarial nivel 2 y 3", Some("azul"), None)
        .await;

    let mut seen = HashSet::new();
    for source in &response.sources {
        assert!(seen.insert(source.id), "duplicate source id {}", source.id);
    }
    assert!(!response.sources.is_empty());
}

#[tokio::test]
async fn test_empty_retrieval_returns_fixed_answer() {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();

    let db = Mutex::new(db);
    let pipeline = build_pipeline();
    let response = pipeline
        .chat(&db, "¿qué dice el convenio de marte?", None, None)
        .await;

    assert_eq!(response.answer, NO_INFORMATION_ANSWER);
    assert!(response.sources.is_empty());
    assert!(response.calculation.is_none());
    assert!(response.audit.is_none());
}
