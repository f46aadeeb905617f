//! Deterministic anchor retrieval
//!
//! Anchors are authoritative fragments (tables, articles, regulations)
//! selected by metadata filters instead of similarity ranking. Results are
//! cached for one hour under a key that includes the company's content
//! fingerprint, so re-ingestion invalidates naturally.

use crate::companies::GENERIC_COMPANY;
use crate::db::Database;
use crate::intent::Intent;
use crate::llm::TtlCache;
use crate::model::{FragmentType, LegalFragment};
use chrono::{Datelike, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Fingerprint used when a company has no fragments yet
const DEFAULT_FINGERPRINT: &str = "default";

/// Accepted staleness window for anchor results
const ANCHOR_TTL: Duration = Duration::from_secs(3600);

/// Cache key: (intent, company, fingerprint, year)
type AnchorKey = (Intent, String, String, i32);

/// Deterministic, metadata-filtered fragment lookup with a time-bounded cache
pub struct AnchorRetriever {
    cache: TtlCache<AnchorKey, Vec<LegalFragment>>,
    store_queries: AtomicU64,
}

impl AnchorRetriever {
    pub fn new() -> Self {
        Self::with_ttl(ANCHOR_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
            store_queries: AtomicU64::new(0),
        }
    }

    /// Number of store queries issued so far (cache-behavior verification)
    pub fn store_query_count(&self) -> u64 {
        self.store_queries.load(Ordering::Relaxed)
    }

    /// Fetch anchor fragments for an intent.
    ///
    /// GENERAL has no anchors and short-circuits to empty. Store errors are
    /// logged and swallowed: this retriever never raises past its boundary.
    pub fn fetch(
        &self,
        db: &Database,
        intent: Intent,
        company_slug: Option<&str>,
        year: Option<i32>,
        limit: usize,
    ) -> Vec<LegalFragment> {
        let Some(allowed_types) = intent_type_allow_list(intent) else {
            tracing::debug!(intent = %intent, "no anchors defined for intent");
            return Vec::new();
        };

        let year = year.unwrap_or_else(|| Utc::now().year());
        let company = company_slug.unwrap_or(GENERIC_COMPANY);

        let fingerprint = match db.latest_fingerprint(company) {
            Ok(Some(fp)) => fp,
            Ok(None) => DEFAULT_FINGERPRINT.to_string(),
            Err(e) => {
                tracing::error!("fingerprint lookup failed: {}", e);
                return Vec::new();
            }
        };

        let key: AnchorKey = (intent, company.to_string(), fingerprint.clone(), year);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(intent = %intent, company, "anchor cache hit");
            return cached;
        }

        self.store_queries.fetch_add(1, Ordering::Relaxed);
        match db.anchor_fragments(intent, allowed_types, company_slug, year, &fingerprint, limit)
        {
            Ok(fragments) => {
                if fragments.is_empty() {
                    tracing::warn!(
                        intent = %intent,
                        company,
                        year,
                        "anchor intent active but no matching fragments"
                    );
                } else {
                    tracing::info!(
                        intent = %intent,
                        company,
                        count = fragments.len(),
                        "anchors injected"
                    );
                }
                self.cache.set(key, fragments.clone());
                fragments
            }
            Err(e) => {
                tracing::error!("anchor retrieval failed: {}", e);
                Vec::new()
            }
        }
    }
}

impl Default for AnchorRetriever {
    fn default() -> Self {
        Self::new()
    }
}

/// Fragment types considered authoritative per intent.
/// GENERAL returns `None`: similarity search alone decides.
fn intent_type_allow_list(intent: Intent) -> Option<&'static [FragmentType]> {
    match intent {
        Intent::Salary => Some(&[FragmentType::Table]),
        Intent::Dismissal => Some(&[FragmentType::Regulation]),
        Intent::Leave => Some(&[FragmentType::Article, FragmentType::Table]),
        Intent::General => None,
    }
}
