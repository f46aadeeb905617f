//! Database layer for convenio
//!
//! SQLite-backed stores:
//! - legal fragments with structured metadata and BLOB embeddings
//! - salary line items and variable-concept definitions

mod fragments;
mod salary;
mod schema;
pub mod vectors;

pub use fragments::FragmentInsert;
pub use schema::Database;
pub use vectors::cosine_similarity;

use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("CONVENIO_DB") {
            return PathBuf::from(path);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME)
            .join("convenio.sqlite")
    }
}
