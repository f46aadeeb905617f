//! Fragment store operations

use super::Database;
use crate::companies::GENERIC_COMPANY;
use crate::error::Result;
use crate::intent::Intent;
use crate::model::{FragmentMetadata, FragmentType, LegalFragment};
use chrono::Utc;
use rusqlite::{params, Row};

/// Parameters for inserting a fragment (ingestion and tests)
#[derive(Debug, Clone)]
pub struct FragmentInsert<'a> {
    pub document_id: i64,
    pub content: &'a str,
    pub article_ref: Option<&'a str>,
    pub company: &'a str,
    pub intents: &'a [Intent],
    pub fragment_type: FragmentType,
    pub year: i32,
    pub version_fingerprint: &'a str,
    pub is_primary: bool,
}

impl Database {
    /// Insert a parent legal document
    pub fn insert_document(&self, title: &str, category: &str, company: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO legal_documents (title, category, company) VALUES (?1, ?2, ?3)",
            params![title, category, company],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a fragment; `size_bytes` is derived from the content
    pub fn insert_fragment(&self, frag: &FragmentInsert) -> Result<i64> {
        let intents_json = serde_json::to_string(
            &frag.intents.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
        )?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO fragments
                (document_id, content, article_ref, company, intents, fragment_type,
                 year, version_fingerprint, is_primary, size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                frag.document_id,
                frag.content,
                frag.article_ref,
                frag.company,
                intents_json,
                frag.fragment_type.as_str(),
                frag.year,
                frag.version_fingerprint,
                frag.is_primary as i64,
                frag.content.len() as i64,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fetch a single fragment by id
    pub fn get_fragment(&self, id: i64) -> Result<Option<LegalFragment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FRAGMENT_SELECT} WHERE f.id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], fragment_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Most recent version fingerprint for a company's fragments.
    ///
    /// Returns `None` when the company has no fragments yet; callers fall
    /// back to the literal `"default"` fingerprint.
    pub fn latest_fingerprint(&self, company: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT version_fingerprint FROM fragments
             WHERE company = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            params![company],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(fp) => Ok(Some(fp)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deterministic anchor lookup: primary fragments matching the intent,
    /// an intent-specific type allow-list, company (or the generic corpus
    /// when no company is given), year and fingerprint, largest first.
    pub fn anchor_fragments(
        &self,
        intent: Intent,
        allowed_types: &[FragmentType],
        company: Option<&str>,
        year: i32,
        fingerprint: &str,
        limit: usize,
    ) -> Result<Vec<LegalFragment>> {
        let type_list = allowed_types
            .iter()
            .map(|t| format!("'{}'", t.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "{FRAGMENT_SELECT}
             WHERE f.intents LIKE ?1
               AND f.fragment_type IN ({type_list})
               AND (f.company = ?2 OR f.company = ?3)
               AND f.year = ?4
               AND f.version_fingerprint = ?5
               AND f.is_primary = 1
             ORDER BY f.size_bytes DESC
             LIMIT ?6"
        );

        let intent_pattern = format!("%\"{}\"%", intent.as_str());
        let company = company.unwrap_or(GENERIC_COMPANY);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    intent_pattern,
                    company,
                    GENERIC_COMPANY,
                    year,
                    fingerprint,
                    limit as i64
                ],
                fragment_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fragments whose article reference contains the given article number,
    /// optionally restricted to statute documents.
    pub fn fragments_by_article(
        &self,
        article_number: &str,
        statute_only: bool,
        company: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LegalFragment>> {
        let mut sql = format!(
            "{FRAGMENT_SELECT}
             WHERE f.article_ref IS NOT NULL
               AND (f.article_ref LIKE ?1 OR f.article_ref LIKE ?2)
               AND (f.company = ?3 OR f.company = ?4)"
        );
        if statute_only {
            sql.push_str(" AND LOWER(d.category) = 'estatuto'");
        }
        sql.push_str(" ORDER BY f.id LIMIT ?5");

        // "Art. 45" and "Artículo 45" forms; the trailing boundary avoids
        // matching "Art. 451" when asked for 45.
        let exact = format!("%. {}", article_number);
        let spaced = format!("% {}", article_number);
        let company = company.unwrap_or(GENERIC_COMPANY);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![exact, spaced, company, GENERIC_COMPANY, limit as i64],
                fragment_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fragments whose reference looks like an annex or salary table, for
    /// force-inclusion on salary queries. Reduced-mobility (PMR) tables are
    /// excluded unless explicitly requested.
    pub fn annex_fragments(
        &self,
        company: &str,
        include_reduced_mobility: bool,
        limit: usize,
    ) -> Result<Vec<LegalFragment>> {
        let mut sql = format!(
            "{FRAGMENT_SELECT}
             WHERE f.article_ref IS NOT NULL
               AND (LOWER(f.article_ref) LIKE '%anexo%' OR LOWER(f.article_ref) LIKE '%tabla%')
               AND (f.company = ?1 OR f.company = ?2)"
        );
        if !include_reduced_mobility {
            sql.push_str(
                " AND LOWER(f.content) NOT LIKE '%movilidad reducida%'
                  AND LOWER(f.content) NOT LIKE '%pmr%'",
            );
        }
        sql.push_str(" ORDER BY LENGTH(f.content) DESC LIMIT ?3");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![company, GENERIC_COMPANY, limit as i64],
                fragment_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

const FRAGMENT_SELECT: &str = "SELECT f.id, f.document_id, d.title, f.content, f.article_ref,
        f.company, f.intents, f.fragment_type, f.year, f.version_fingerprint,
        f.is_primary, f.size_bytes
     FROM fragments f
     JOIN legal_documents d ON d.id = f.document_id";

fn fragment_from_row(row: &Row) -> rusqlite::Result<LegalFragment> {
    let intents_json: String = row.get(6)?;
    let intents: Vec<Intent> = serde_json::from_str::<Vec<String>>(&intents_json)
        .map(|labels| labels.iter().filter_map(|l| Intent::parse(l)).collect())
        .unwrap_or_default();
    let fragment_type: String = row.get(7)?;

    Ok(LegalFragment {
        id: row.get(0)?,
        document_id: row.get(1)?,
        document_title: row.get(2)?,
        content: row.get(3)?,
        article_ref: row.get(4)?,
        metadata: FragmentMetadata {
            company: row.get(5)?,
            intents,
            fragment_type: FragmentType::parse(&fragment_type),
            year: row.get(8)?,
            version_fingerprint: row.get(9)?,
            is_primary: row.get::<_, i64>(10)? != 0,
            size_bytes: row.get::<_, i64>(11)? as usize,
        },
    })
}
