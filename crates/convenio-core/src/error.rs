//! Error types for convenio

use thiserror::Error;

/// Result type alias using ConvenioError
pub type Result<T> = std::result::Result<T, ConvenioError>;

/// Error type alias for convenience
pub type Error = ConvenioError;

/// Main error type for convenio
#[derive(Debug, Error)]
pub enum ConvenioError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
