//! Convenio Core Library
//!
//! Core functionality for the convenio labor-agreement assistant.
//!
//! # Features
//! - Hybrid retrieval: deterministic anchors + vector similarity + merging
//! - Query normalization with heuristic rules and model fallback
//! - Deterministic payroll engine over stored salary tables
//! - Hybrid LLM-extraction calculator with local arithmetic guardrails
//! - Answer generation with per-intent prompts and an audit pass

pub mod answer;
pub mod calc;
pub mod companies;
pub mod config;
pub mod db;
pub mod error;
pub mod intent;
pub mod kinship;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod retrieval;

pub use answer::{
    AnswerAuditor, AnswerGenerator, AuditVerdict, CONFIGURATION_ERROR_ANSWER,
    NO_INFORMATION_ANSWER,
};
pub use calc::{
    detect, BreakdownLine, CalculationFailure, CalculationKind, CalculationOutcome, FlatPayroll,
    HybridExtractionCalculator, LineKind, SalaryCalculation, SalaryCalculationEngine,
};
pub use config::{Config, LlmServiceConfig};
pub use db::Database;
pub use error::{ConvenioError, Result};
pub use intent::Intent;
pub use llm::{ChatMessage, Embedder, GenerativeClient, HttpLlmClient, TtlCache};
pub use model::{
    EmployeeProfile, FragmentMetadata, FragmentType, InputKind, LegalFragment, SalaryLineItem,
    ScoredFragment, VariableConceptDefinition,
};
pub use pipeline::{ChatPipeline, ChatResponse, SourceSummary};
pub use query::{NormalizedQuery, QueryNormalizer};
pub use retrieval::{AnchorRetriever, ResultMerger, RetrievalSource, RetrievedFragment, VectorRetriever};

/// Default data directory name
pub const DATA_DIR_NAME: &str = "convenio";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "convenio";
