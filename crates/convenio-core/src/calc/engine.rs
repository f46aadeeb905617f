//! Deterministic payroll calculation
//!
//! All figures come from the salary store plus explicit inputs; missing
//! data degrades through a documented fallback ladder and is logged, never
//! silently invented. Internal arithmetic stays unrounded; only reported
//! values are rounded to 2 decimals.

use crate::companies::{salary_table_slug, INVERTED_LEVEL_COMPANY};
use crate::db::Database;
use crate::model::{EmployeeProfile, InputKind};
use serde::Serialize;

/// Concept the base-annual figure is stored under in the salary table
const BASE_CONCEPT: &str = "BASE_ANNUAL";

/// Standard payment count: 12 monthly + 2 extraordinary
const STANDARD_PAYMENTS: f64 = 14.0;

/// Hardcoded default level used when the profile's level is unknown
const DEFAULT_LEVEL: &str = "Nivel entrada";

/// Absolute floor: lowest sector table value, last-resort fallback
const FLOOR_BASE_ANNUAL: f64 = 18_450.87;

/// Statutory deduction rates (employee share)
const RATE_COMMON_CONTINGENCIES: f64 = 0.047;
const RATE_TRAINING: f64 = 0.001;
const RATE_UNEMPLOYMENT_TEMPORAL: f64 = 0.0160;
const RATE_UNEMPLOYMENT_INDEFINIDO: f64 = 0.0155;
const DEFAULT_IRPF_RATE: f64 = 0.15;

/// Breakdown line kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Earning,
    Deduction,
}

/// One line of the payroll breakdown; deductions carry negative amounts
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownLine {
    pub name: String,
    pub amount: f64,
    pub kind: LineKind,
}

/// Full payroll computation result
#[derive(Debug, Clone, Serialize)]
pub struct SalaryCalculation {
    pub base_monthly: f64,
    pub variable_total: f64,
    pub gross_monthly: f64,
    pub net_monthly: f64,
    pub breakdown: Vec<BreakdownLine>,
    pub annual_gross_estimate: f64,
}

/// Flat calculator result (gross annual in, no profile)
#[derive(Debug, Clone, Serialize)]
pub struct FlatPayroll {
    pub gross_monthly: f64,
    pub net_monthly: f64,
    pub tax_percentage: f64,
    pub tax_amount: f64,
    pub social_security_amount: f64,
    pub annual_net: f64,
}

/// Which tier of the fallback ladder resolved the base figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolverTier {
    Exact,
    SubstringLevel,
    DefaultLevel,
    ConstantFloor,
}

impl ResolverTier {
    fn name(&self) -> &'static str {
        match self {
            ResolverTier::Exact => "exact",
            ResolverTier::SubstringLevel => "substring-level",
            ResolverTier::DefaultLevel => "default-level",
            ResolverTier::ConstantFloor => "constant-floor",
        }
    }
}

/// Ordered fallback ladder: first success wins
const RESOLVER_LADDER: &[ResolverTier] = &[
    ResolverTier::Exact,
    ResolverTier::SubstringLevel,
    ResolverTier::DefaultLevel,
    ResolverTier::ConstantFloor,
];

/// Deterministic payroll computation from a full employee profile
pub struct SalaryCalculationEngine;

impl SalaryCalculationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute a payslip from a profile and its explicit variable inputs.
    /// Missing data degrades to documented fallbacks; never errors.
    pub fn calculate(
        &self,
        db: &Database,
        profile: &EmployeeProfile,
        year: i32,
    ) -> SalaryCalculation {
        let table_slug = salary_table_slug(&profile.company_slug);

        // One company ships its tables with category and level swapped
        let (group, level) = if table_slug == INVERTED_LEVEL_COMPANY {
            (profile.salary_level.as_str(), profile.job_group.as_str())
        } else {
            (profile.job_group.as_str(), profile.salary_level.as_str())
        };

        let annual_base = self.resolve_base_annual(db, table_slug, group, level, year);

        let prorata_factor = profile.contract_percentage / 100.0;
        let full_base_monthly = annual_base / STANDARD_PAYMENTS;
        let base_monthly = full_base_monthly * prorata_factor;

        let mut breakdown = vec![BreakdownLine {
            name: "Salario Base (Parte Proporcional)".to_string(),
            amount: base_monthly,
            kind: LineKind::Earning,
        }];

        // Twelve-payment schemes fold the two extraordinary payments into a
        // separate proration line instead of hiding them in the base
        let base_for_gross = if profile.payments_per_year == 12 {
            let prorata_annual = (annual_base * 2.0 / STANDARD_PAYMENTS) * prorata_factor;
            let prorata_monthly = prorata_annual / 12.0;
            breakdown.push(BreakdownLine {
                name: "Prorrata Pagas Extra".to_string(),
                amount: prorata_monthly,
                kind: LineKind::Earning,
            });
            base_monthly + prorata_monthly
        } else {
            base_monthly
        };

        let variable_total = self.apply_dynamic_inputs(
            db,
            profile,
            table_slug,
            group,
            level,
            year,
            prorata_factor,
            &mut breakdown,
        );

        let gross_monthly = base_for_gross + variable_total;

        // Statutory deductions on the full contribution base
        let unemployment_rate = if profile.contract_type == "temporal" {
            RATE_UNEMPLOYMENT_TEMPORAL
        } else {
            RATE_UNEMPLOYMENT_INDEFINIDO
        };
        let irpf_rate = profile
            .irpf_percentage
            .map(|pct| pct / 100.0)
            .unwrap_or(DEFAULT_IRPF_RATE);

        let val_cc = gross_monthly * RATE_COMMON_CONTINGENCIES;
        let val_unemployment = gross_monthly * unemployment_rate;
        let val_training = gross_monthly * RATE_TRAINING;
        let val_irpf = gross_monthly * irpf_rate;

        breakdown.push(BreakdownLine {
            name: "SS: Contingencias Comunes (4.70%)".to_string(),
            amount: -val_cc,
            kind: LineKind::Deduction,
        });
        breakdown.push(BreakdownLine {
            name: format!("SS: Desempleo ({:.2}%)", unemployment_rate * 100.0),
            amount: -val_unemployment,
            kind: LineKind::Deduction,
        });
        breakdown.push(BreakdownLine {
            name: "SS: Formación Profesional (0.10%)".to_string(),
            amount: -val_training,
            kind: LineKind::Deduction,
        });
        breakdown.push(BreakdownLine {
            name: format!("Retención IRPF ({:.1}%)", irpf_rate * 100.0),
            amount: -val_irpf,
            kind: LineKind::Deduction,
        });

        let net_monthly = gross_monthly - val_cc - val_unemployment - val_training - val_irpf;
        let annual_gross_estimate = annual_base * prorata_factor + variable_total * 12.0;

        SalaryCalculation {
            base_monthly: round2(base_monthly),
            variable_total: round2(variable_total),
            gross_monthly: round2(gross_monthly),
            net_monthly: round2(net_monthly),
            breakdown: breakdown
                .into_iter()
                .map(|line| BreakdownLine {
                    amount: round2(line.amount),
                    ..line
                })
                .collect(),
            annual_gross_estimate: round2(annual_gross_estimate),
        }
    }

    /// Resolve the base annual figure through the ordered fallback ladder.
    /// Non-exact tiers log a warning so silent wrong answers stay auditable.
    fn resolve_base_annual(
        &self,
        db: &Database,
        table_slug: &str,
        group: &str,
        level: &str,
        year: i32,
    ) -> f64 {
        for tier in RESOLVER_LADDER {
            let resolved = match tier {
                ResolverTier::Exact => db
                    .salary_amount(table_slug, group, level, BASE_CONCEPT, year)
                    .unwrap_or_else(|e| {
                        tracing::error!("salary lookup failed: {}", e);
                        None
                    }),
                ResolverTier::SubstringLevel => self
                    .substring_level_match(db, table_slug, group, level, year),
                ResolverTier::DefaultLevel => db
                    .salary_amount(table_slug, group, DEFAULT_LEVEL, BASE_CONCEPT, year)
                    .unwrap_or(None),
                ResolverTier::ConstantFloor => Some(FLOOR_BASE_ANNUAL),
            };

            if let Some(amount) = resolved {
                if *tier != ResolverTier::Exact {
                    tracing::warn!(
                        tier = tier.name(),
                        company = table_slug,
                        group,
                        level,
                        amount,
                        "base salary resolved through fallback tier"
                    );
                }
                return amount;
            }
        }
        // The ladder ends in a constant; this is unreachable
        FLOOR_BASE_ANNUAL
    }

    fn substring_level_match(
        &self,
        db: &Database,
        table_slug: &str,
        group: &str,
        level: &str,
        year: i32,
    ) -> Option<f64> {
        let candidates = db
            .levels_with_amount(table_slug, group, BASE_CONCEPT, year)
            .unwrap_or_default();
        let needle = level.to_lowercase();
        candidates
            .into_iter()
            .find(|(candidate, _)| {
                let c = candidate.to_lowercase();
                c.contains(&needle) || needle.contains(&c)
            })
            .map(|(_, amount)| amount)
    }

    /// Resolve and apply each dynamic input; returns the variable total
    #[allow(clippy::too_many_arguments)]
    fn apply_dynamic_inputs(
        &self,
        db: &Database,
        profile: &EmployeeProfile,
        table_slug: &str,
        group: &str,
        level: &str,
        year: i32,
        prorata_factor: f64,
        breakdown: &mut Vec<BreakdownLine>,
    ) -> f64 {
        let definitions = db
            .concept_definitions(&profile.company_slug)
            .unwrap_or_else(|e| {
                tracing::error!("concept definition lookup failed: {}", e);
                Default::default()
            });

        let mut total = 0.0;
        for (code, input_value) in &profile.dynamic_inputs {
            if *input_value <= 0.0 {
                continue;
            }
            let Some(definition) = definitions.get(code) else {
                tracing::warn!(code, "dynamic input has no active concept definition");
                continue;
            };

            // Unit price priority: per-level override, company rate table,
            // definition default
            let unit_price = definition
                .per_level_overrides
                .as_ref()
                .and_then(|groups| groups.get(group))
                .and_then(|levels| levels.get(level))
                .copied()
                .or_else(|| {
                    db.salary_amount(table_slug, group, level, code, year)
                        .unwrap_or(None)
                })
                .unwrap_or(definition.default_unit_price);

            let amount = match definition.input_kind {
                // Already a computed amount supplied by the caller
                InputKind::CurrencyAmount => *input_value,
                // Monthly-equivalent concepts scale with the contract
                InputKind::Flag | InputKind::Choice => {
                    input_value * unit_price * prorata_factor
                }
                InputKind::Quantity => input_value * unit_price,
            };

            breakdown.push(BreakdownLine {
                name: definition.name.clone(),
                amount,
                kind: LineKind::Earning,
            });
            total += amount;
        }
        total
    }

    /// Flat payroll estimate from a gross annual figure, without a profile.
    ///
    /// Progressive IRPF bracket estimate with a flattening factor; the
    /// caller's age is accepted for API stability but does not yet alter
    /// the estimate.
    pub fn calculate_flat(&self, gross_annual_salary: f64, _age: u32, payments: u32) -> FlatPayroll {
        let payments = if payments == 0 { 12 } else { payments } as f64;

        let ss_rate = 0.0635;
        let ss_amount_annual = gross_annual_salary * ss_rate;

        // Taxable base after social security and a generic deductible
        let taxable = gross_annual_salary - ss_amount_annual - 2000.0;

        let bracket_rate = if taxable < 12_450.0 {
            0.19
        } else if taxable < 20_200.0 {
            0.24
        } else if taxable < 35_200.0 {
            0.30
        } else if taxable < 60_000.0 {
            0.37
        } else if taxable < 300_000.0 {
            0.45
        } else {
            0.47
        };
        // Rough effective-rate adjustment: the marginal bracket overstates
        // the average rate
        let effective_rate = bracket_rate * 0.7;

        let tax_amount_annual = taxable.max(0.0) * effective_rate;
        let annual_net = gross_annual_salary - ss_amount_annual - tax_amount_annual;

        FlatPayroll {
            gross_monthly: round2(gross_annual_salary / payments),
            net_monthly: round2(annual_net / payments),
            tax_percentage: round2(effective_rate * 100.0),
            tax_amount: round2(tax_amount_annual),
            social_security_amount: round2(ss_amount_annual),
            annual_net: round2(annual_net),
        }
    }
}

impl Default for SalaryCalculationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to 2 decimals; applied only at the reporting boundary
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SalaryLineItem, VariableConceptDefinition};
    use std::collections::HashMap;

    const YEAR: i32 = 2025;

    fn seed_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        for (level, base, extra_hour) in [
            ("Nivel entrada", 18_450.87, 16.17),
            ("Nivel 2", 21_850.75, 19.14),
            ("Nivel 3", 22_507.75, 19.72),
        ] {
            db.upsert_salary_item(&SalaryLineItem {
                company_slug: "azul".into(),
                group: "Serv. Auxiliares".into(),
                level: level.into(),
                concept: "BASE_ANNUAL".into(),
                amount: base,
                year: YEAR,
            })
            .unwrap();
            db.upsert_salary_item(&SalaryLineItem {
                company_slug: "azul".into(),
                group: "Serv. Auxiliares".into(),
                level: level.into(),
                concept: "HORA_EXTRA".into(),
                amount: extra_hour,
                year: YEAR,
            })
            .unwrap();
        }

        db.upsert_concept_definition(&VariableConceptDefinition {
            company_slug: "azul".into(),
            code: "HORA_EXTRA".into(),
            name: "Horas Extra".into(),
            input_kind: crate::model::InputKind::Quantity,
            default_unit_price: 15.0,
            per_level_overrides: None,
            is_active: true,
        })
        .unwrap();
        db.upsert_concept_definition(&VariableConceptDefinition {
            company_slug: "azul".into(),
            code: "PLUS_NOCTURNO".into(),
            name: "Plus Nocturnidad".into(),
            input_kind: crate::model::InputKind::Flag,
            default_unit_price: 120.0,
            per_level_overrides: None,
            is_active: true,
        })
        .unwrap();

        db
    }

    fn profile() -> EmployeeProfile {
        EmployeeProfile {
            company_slug: "azul".into(),
            job_group: "Serv. Auxiliares".into(),
            salary_level: "Nivel 3".into(),
            contract_percentage: 100.0,
            contract_type: "indefinido".into(),
            payments_per_year: 14,
            irpf_percentage: None,
            dynamic_inputs: HashMap::new(),
        }
    }

    #[test]
    fn test_net_never_exceeds_gross() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate(&db, &profile(), YEAR);
        assert!(result.net_monthly <= result.gross_monthly);
    }

    #[test]
    fn test_deduction_lines_non_positive() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate(&db, &profile(), YEAR);
        for line in &result.breakdown {
            if line.kind == LineKind::Deduction {
                assert!(line.amount <= 0.0, "deduction {} must be negative", line.name);
            }
        }
    }

    #[test]
    fn test_base_monthly_is_annual_over_fourteen() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate(&db, &profile(), YEAR);
        assert!((result.base_monthly - round2(22_507.75 / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_twelve_payment_proration_round_trip() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut twelve = profile();
        twelve.payments_per_year = 12;
        let result = engine.calculate(&db, &twelve, YEAR);

        let proration = result
            .breakdown
            .iter()
            .find(|l| l.name == "Prorrata Pagas Extra")
            .expect("proration line present");

        // base + proration over 12 payments must equal annual/12
        let total = result.base_monthly + proration.amount;
        assert!((total - 22_507.75 / 12.0).abs() < 0.02);
    }

    #[test]
    fn test_fourteen_payments_have_no_proration_line() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate(&db, &profile(), YEAR);
        assert!(result
            .breakdown
            .iter()
            .all(|l| l.name != "Prorrata Pagas Extra"));
    }

    #[test]
    fn test_contract_percentage_scales_base() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut half = profile();
        half.contract_percentage = 50.0;
        let full = engine.calculate(&db, &profile(), YEAR);
        let part = engine.calculate(&db, &half, YEAR);
        assert!((part.base_monthly - full.base_monthly / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_quantity_input_priced_from_rate_table() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut with_hours = profile();
        with_hours.dynamic_inputs.insert("HORA_EXTRA".into(), 10.0);
        let result = engine.calculate(&db, &with_hours, YEAR);

        // Nivel 3 rate (19.72) beats the definition default (15.0)
        let line = result
            .breakdown
            .iter()
            .find(|l| l.name == "Horas Extra")
            .expect("extra hours line");
        assert!((line.amount - 197.20).abs() < 0.01);
    }

    #[test]
    fn test_flag_input_scaled_by_contract() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut with_plus = profile();
        with_plus.contract_percentage = 50.0;
        with_plus.dynamic_inputs.insert("PLUS_NOCTURNO".into(), 1.0);
        let result = engine.calculate(&db, &with_plus, YEAR);

        let line = result
            .breakdown
            .iter()
            .find(|l| l.name == "Plus Nocturnidad")
            .expect("night plus line");
        assert!((line.amount - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_substring_level_fallback() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut fuzzy = profile();
        fuzzy.salary_level = "nivel 3".into(); // lowercase, no exact row
        let result = engine.calculate(&db, &fuzzy, YEAR);
        assert!((result.base_monthly - round2(22_507.75 / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_unknown_level_falls_to_entry_level() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut unknown = profile();
        unknown.salary_level = "Nivel 9".into();
        let result = engine.calculate(&db, &unknown, YEAR);
        assert!((result.base_monthly - round2(18_450.87 / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_empty_store_falls_to_constant_floor() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate(&db, &profile(), YEAR);
        assert!((result.base_monthly - round2(FLOOR_BASE_ANNUAL / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_sector_company_uses_sector_tables() {
        let db = seed_db();
        db.upsert_salary_item(&SalaryLineItem {
            company_slug: "convenio-sector".into(),
            group: "Serv. Auxiliares".into(),
            level: "Nivel 3".into(),
            concept: "BASE_ANNUAL".into(),
            amount: 20_000.0,
            year: YEAR,
        })
        .unwrap();

        let engine = SalaryCalculationEngine::new();
        let mut sector = profile();
        sector.company_slug = "jet2".into();
        let result = engine.calculate(&db, &sector, YEAR);
        assert!((result.base_monthly - round2(20_000.0 / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_inverted_company_swaps_group_and_level() {
        let db = seed_db();
        // easyjet tables key by level first, category second
        db.upsert_salary_item(&SalaryLineItem {
            company_slug: "easyjet".into(),
            group: "Nivel 1".into(),
            level: "Agentes".into(),
            concept: "BASE_ANNUAL".into(),
            amount: 19_500.0,
            year: YEAR,
        })
        .unwrap();

        let engine = SalaryCalculationEngine::new();
        let mut inverted = profile();
        inverted.company_slug = "easyjet".into();
        inverted.job_group = "Agentes".into();
        inverted.salary_level = "Nivel 1".into();
        let result = engine.calculate(&db, &inverted, YEAR);
        assert!((result.base_monthly - round2(19_500.0 / 14.0)).abs() < 0.01);
    }

    #[test]
    fn test_temporal_contract_higher_unemployment() {
        let db = seed_db();
        let engine = SalaryCalculationEngine::new();

        let mut temporal = profile();
        temporal.contract_type = "temporal".into();
        let fixed = engine.calculate(&db, &profile(), YEAR);
        let temp = engine.calculate(&db, &temporal, YEAR);
        assert!(temp.net_monthly < fixed.net_monthly);
    }

    #[test]
    fn test_flat_payroll() {
        let engine = SalaryCalculationEngine::new();
        let result = engine.calculate_flat(28_000.0, 30, 12);

        assert!(result.net_monthly < result.gross_monthly);
        assert!((result.gross_monthly - round2(28_000.0 / 12.0)).abs() < 0.01);
        assert!(result.social_security_amount > 0.0);
        assert!(result.annual_net < 28_000.0);
    }
}
