//! Calculation layer: trigger detection, deterministic payroll, and the
//! hybrid extraction calculator

pub mod detector;
pub mod engine;
pub mod hybrid;
pub mod levels;

pub use detector::{detect, CalculationKind};
pub use engine::{
    round2, BreakdownLine, FlatPayroll, LineKind, SalaryCalculation, SalaryCalculationEngine,
};
pub use hybrid::{
    normalize_number, CalculationFailure, CalculationOutcome, CalculationResult,
    HybridExtractionCalculator,
};
