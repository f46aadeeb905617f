//! Shared application state

use anyhow::Result;
use convenio_core::{
    AnswerAuditor, AnswerGenerator, AnchorRetriever, ChatPipeline, Config, Database, Embedder,
    GenerativeClient, HttpLlmClient, HybridExtractionCalculator, QueryNormalizer, ResultMerger,
    SalaryCalculationEngine, VectorRetriever,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub pipeline: Arc<ChatPipeline>,
    pub vector: Arc<VectorRetriever>,
    pub engine: Arc<SalaryCalculationEngine>,
}

impl AppState {
    pub fn new(config: Config, db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        db.initialize()?;

        let llm = Arc::new(HttpLlmClient::new(config.llm_service.clone())?);
        let generative: Arc<dyn GenerativeClient> = llm.clone();
        let embedder: Arc<dyn Embedder> = llm;

        let anchors = Arc::new(AnchorRetriever::new());
        let vector = Arc::new(VectorRetriever::new(embedder));
        let merger = ResultMerger::new(anchors, vector.clone());

        // The audit pass runs on its own client so it can use a lighter
        // model and a shorter timeout
        let auditor = if config.audit_enabled {
            let mut audit_service = config.llm_service.clone();
            audit_service.model = audit_service.audit_model.clone();
            audit_service.timeout_secs = audit_service.audit_timeout_secs;
            let audit_client: Arc<dyn GenerativeClient> =
                Arc::new(HttpLlmClient::new(audit_service)?);
            Some(AnswerAuditor::new(
                audit_client,
                config.llm_service.audit_timeout_secs,
            ))
        } else {
            None
        };

        let pipeline = ChatPipeline::new(
            QueryNormalizer::new(Some(generative.clone())),
            merger,
            HybridExtractionCalculator::new(generative.clone()),
            AnswerGenerator::new(generative, config.llm_service.clone()),
            auditor,
        );

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            pipeline: Arc::new(pipeline),
            vector,
            engine: Arc::new(SalaryCalculationEngine::new()),
        })
    }
}
