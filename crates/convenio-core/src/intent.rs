//! Query intent classification domain

use serde::{Deserialize, Serialize};

/// Coarse classification of a query's subject area.
///
/// Every query resolves to exactly one intent; `General` is the fallback
/// when nothing more specific applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Salary,
    Leave,
    Dismissal,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Salary => "SALARY",
            Intent::Leave => "LEAVE",
            Intent::Dismissal => "DISMISSAL",
            Intent::General => "GENERAL",
        }
    }

    /// Parse a model-supplied intent label, rejecting anything outside the enum.
    pub fn parse(s: &str) -> Option<Intent> {
        match s.trim().to_uppercase().as_str() {
            "SALARY" => Some(Intent::Salary),
            "LEAVE" => Some(Intent::Leave),
            "DISMISSAL" => Some(Intent::Dismissal),
            "GENERAL" => Some(Intent::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
