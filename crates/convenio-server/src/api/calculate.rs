//! Payroll endpoints

use super::{bad_request, ApiError};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Datelike;
use convenio_core::{EmployeeProfile, FlatPayroll, SalaryCalculation};
use serde::Deserialize;

/// POST /calculate - full payslip from an employee profile
pub async fn calculate(
    State(state): State<AppState>,
    Json(profile): Json<EmployeeProfile>,
) -> Result<Json<SalaryCalculation>, ApiError> {
    if !convenio_core::companies::is_valid_company(&profile.company_slug) {
        return Err(bad_request(format!(
            "unknown company: {}",
            profile.company_slug
        )));
    }
    if profile.contract_percentage <= 0.0 || profile.contract_percentage > 100.0 {
        return Err(bad_request("contract_percentage must be in (0, 100]"));
    }

    let year = chrono::Utc::now().year();
    let db = state.db.lock().await;
    let result = state.engine.calculate(&db, &profile, year);
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct SimpleCalculationRequest {
    pub gross_annual_salary: f64,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default = "default_payments")]
    pub payments_per_year: u32,
}

fn default_age() -> u32 {
    30
}

fn default_payments() -> u32 {
    12
}

/// POST /calculate-simple - flat estimate from a gross annual figure
pub async fn calculate_simple(
    State(state): State<AppState>,
    Json(req): Json<SimpleCalculationRequest>,
) -> Result<Json<FlatPayroll>, ApiError> {
    if req.gross_annual_salary <= 0.0 {
        return Err(bad_request("gross_annual_salary must be positive"));
    }
    let result = state
        .engine
        .calculate_flat(req.gross_annual_salary, req.age, req.payments_per_year);
    Ok(Json(result))
}
