//! Salary table and variable-concept operations

use super::Database;
use crate::error::Result;
use crate::model::{InputKind, SalaryLineItem, VariableConceptDefinition};
use rusqlite::{params, Row};
use std::collections::HashMap;

impl Database {
    /// Insert or replace a salary line item
    pub fn upsert_salary_item(&self, item: &SalaryLineItem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO salary_items (company_slug, job_group, level, concept, amount, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(company_slug, job_group, level, concept, year)
             DO UPDATE SET amount = excluded.amount",
            params![
                item.company_slug,
                item.group,
                item.level,
                item.concept,
                item.amount,
                item.year
            ],
        )?;
        Ok(())
    }

    /// Exact amount lookup for the 5-tuple key
    pub fn salary_amount(
        &self,
        company_slug: &str,
        group: &str,
        level: &str,
        concept: &str,
        year: i32,
    ) -> Result<Option<f64>> {
        let result = self.conn.query_row(
            "SELECT amount FROM salary_items
             WHERE company_slug = ?1 AND job_group = ?2 AND level = ?3
               AND concept = ?4 AND year = ?5",
            params![company_slug, group, level, concept, year],
            |row| row.get::<_, f64>(0),
        );
        match result {
            Ok(amount) => Ok(Some(amount)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All (level, amount) pairs for a company/group/concept/year, used by
    /// the substring-match fallback tier.
    pub fn levels_with_amount(
        &self,
        company_slug: &str,
        group: &str,
        concept: &str,
        year: i32,
    ) -> Result<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT level, amount FROM salary_items
             WHERE company_slug = ?1 AND job_group = ?2 AND concept = ?3 AND year = ?4
             ORDER BY level",
        )?;
        let rows = stmt
            .query_map(params![company_slug, group, concept, year], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert or replace a variable-concept definition
    pub fn upsert_concept_definition(&self, def: &VariableConceptDefinition) -> Result<()> {
        let overrides_json = match &def.per_level_overrides {
            Some(map) => Some(serde_json::to_string(map)?),
            None => None,
        };
        self.conn.execute(
            "INSERT INTO concept_definitions
                (company_slug, code, name, input_kind, default_unit_price,
                 per_level_overrides, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(company_slug, code) DO UPDATE SET
                name = excluded.name,
                input_kind = excluded.input_kind,
                default_unit_price = excluded.default_unit_price,
                per_level_overrides = excluded.per_level_overrides,
                is_active = excluded.is_active",
            params![
                def.company_slug,
                def.code,
                def.name,
                def.input_kind.as_str(),
                def.default_unit_price,
                overrides_json,
                def.is_active as i64,
            ],
        )?;
        Ok(())
    }

    /// Active variable-concept definitions for a company, keyed by code
    pub fn concept_definitions(
        &self,
        company_slug: &str,
    ) -> Result<HashMap<String, VariableConceptDefinition>> {
        let mut stmt = self.conn.prepare(
            "SELECT company_slug, code, name, input_kind, default_unit_price,
                    per_level_overrides, is_active
             FROM concept_definitions
             WHERE company_slug = ?1 AND is_active = 1",
        )?;
        let rows = stmt
            .query_map(params![company_slug], concept_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(|d| (d.code.clone(), d)).collect())
    }

    /// Distinct companies present in the salary store
    pub fn list_companies(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT company_slug FROM salary_items ORDER BY company_slug",
        )?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct job groups for a company
    pub fn list_groups(&self, company_slug: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT job_group FROM salary_items WHERE company_slug = ?1 ORDER BY job_group",
        )?;
        let rows = stmt
            .query_map(params![company_slug], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct levels for a company (optionally one group)
    pub fn list_levels(&self, company_slug: &str, group: Option<&str>) -> Result<Vec<String>> {
        match group {
            Some(g) => {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT level FROM salary_items
                     WHERE company_slug = ?1 AND job_group = ?2 ORDER BY level",
                )?;
                let rows = stmt
                    .query_map(params![company_slug, g], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT level FROM salary_items
                     WHERE company_slug = ?1 ORDER BY level",
                )?;
                let rows = stmt
                    .query_map(params![company_slug], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        }
    }
}

fn concept_from_row(row: &Row) -> rusqlite::Result<VariableConceptDefinition> {
    let input_kind: String = row.get(3)?;
    let overrides_json: Option<String> = row.get(5)?;
    let per_level_overrides =
        overrides_json.and_then(|json| serde_json::from_str(&json).ok());

    Ok(VariableConceptDefinition {
        company_slug: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        input_kind: InputKind::parse(&input_kind),
        default_unit_price: row.get(4)?,
        per_level_overrides,
        is_active: row.get::<_, i64>(6)? != 0,
    })
}
