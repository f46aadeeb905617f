//! Domain types shared across the retrieval and calculation layers

use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structural classification of a legal fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentType {
    Table,
    Article,
    Regulation,
    Text,
}

impl FragmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentType::Table => "table",
            FragmentType::Article => "article",
            FragmentType::Regulation => "regulation",
            FragmentType::Text => "text",
        }
    }

    pub fn parse(s: &str) -> FragmentType {
        match s {
            "table" => FragmentType::Table,
            "article" => FragmentType::Article,
            "regulation" => FragmentType::Regulation,
            _ => FragmentType::Text,
        }
    }
}

/// Structured metadata attached to every fragment at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentMetadata {
    pub company: String,
    pub intents: Vec<Intent>,
    pub fragment_type: FragmentType,
    pub year: i32,
    pub version_fingerprint: String,
    /// True only for authoritative table/article fragments.
    pub is_primary: bool,
    pub size_bytes: usize,
}

/// A chunk of legal text or tabular data with attached metadata.
///
/// Fragments are created during ingestion and are read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalFragment {
    pub id: i64,
    pub document_id: i64,
    pub document_title: String,
    pub content: String,
    pub article_ref: Option<String>,
    pub metadata: FragmentMetadata,
}

/// A fragment paired with its similarity score (lower distance = closer).
#[derive(Debug, Clone, Serialize)]
pub struct ScoredFragment {
    pub fragment: LegalFragment,
    pub score: f32,
}

/// One row of a salary table: company x group x level x concept x year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryLineItem {
    pub company_slug: String,
    pub group: String,
    pub level: String,
    pub concept: String,
    pub amount: f64,
    pub year: i32,
}

/// How a variable concept's user input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Multiplied by unit price, not scaled by contract percentage.
    Quantity,
    /// On/off monthly concept, scaled by contract percentage.
    Flag,
    /// One-of-several monthly concept, scaled by contract percentage.
    Choice,
    /// Already a computed amount; passed through untouched.
    CurrencyAmount,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Quantity => "quantity",
            InputKind::Flag => "flag",
            InputKind::Choice => "choice",
            InputKind::CurrencyAmount => "currency_amount",
        }
    }

    pub fn parse(s: &str) -> InputKind {
        match s {
            "flag" => InputKind::Flag,
            "choice" => InputKind::Choice,
            // Legacy rows use "currency" / "manual" for pass-through amounts
            "currency_amount" | "currency" | "manual" => InputKind::CurrencyAmount,
            _ => InputKind::Quantity,
        }
    }
}

/// Company-specific definition of a variable payroll concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConceptDefinition {
    pub company_slug: String,
    pub code: String,
    pub name: String,
    pub input_kind: InputKind,
    pub default_unit_price: f64,
    /// group -> level -> unit price, when the concept is priced per level.
    pub per_level_overrides: Option<HashMap<String, HashMap<String, f64>>>,
    pub is_active: bool,
}

/// Request-scoped employee profile; never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub company_slug: String,
    pub job_group: String,
    pub salary_level: String,
    #[serde(default = "default_contract_percentage")]
    pub contract_percentage: f64,
    #[serde(default = "default_contract_type")]
    pub contract_type: String,
    #[serde(default = "default_payments")]
    pub payments_per_year: u32,
    #[serde(default)]
    pub irpf_percentage: Option<f64>,
    #[serde(default)]
    pub dynamic_inputs: HashMap<String, f64>,
}

fn default_contract_percentage() -> f64 {
    100.0
}

fn default_contract_type() -> String {
    "indefinido".to_string()
}

fn default_payments() -> u32 {
    14
}
