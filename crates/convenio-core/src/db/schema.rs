//! Database schema and initialization

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Main database handle
pub struct Database {
    pub(crate) conn: Connection,
}

const SCHEMA_VERSION: i32 = 2;

const CREATE_TABLES: &str = r#"
-- Parent legal documents (convenio, estatuto, jurisprudencia)
CREATE TABLE IF NOT EXISTS legal_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    company TEXT,
    url_source TEXT
);

-- Legal-text fragments with structured metadata
CREATE TABLE IF NOT EXISTS fragments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES legal_documents(id),
    content TEXT NOT NULL,
    article_ref TEXT,
    company TEXT NOT NULL,
    intents TEXT NOT NULL,
    fragment_type TEXT NOT NULL,
    year INTEGER NOT NULL,
    version_fingerprint TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    size_bytes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fragments_article_ref ON fragments(article_ref);
CREATE INDEX IF NOT EXISTS idx_fragments_company_year ON fragments(company, year);

-- Fragment embeddings stored as f32 little-endian BLOBs
CREATE TABLE IF NOT EXISTS fragment_embeddings (
    fragment_id INTEGER PRIMARY KEY REFERENCES fragments(id),
    embedding BLOB NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Salary line items (company x group x level x concept x year)
CREATE TABLE IF NOT EXISTS salary_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_slug TEXT NOT NULL,
    job_group TEXT NOT NULL,
    level TEXT NOT NULL,
    concept TEXT NOT NULL,
    amount REAL NOT NULL,
    year INTEGER NOT NULL,
    UNIQUE(company_slug, job_group, level, concept, year)
);

-- Company-specific variable concept definitions
CREATE TABLE IF NOT EXISTS concept_definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_slug TEXT NOT NULL,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    input_kind TEXT NOT NULL,
    default_unit_price REAL NOT NULL DEFAULT 0,
    per_level_overrides TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    UNIQUE(company_slug, code)
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

impl Database {
    /// Open database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Create tables and record the schema version
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(CREATE_TABLES)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }
}
