use serde::Serialize;
use thiserror::Error;

/// Parameters for one projection run. Rates are percentages (10 means 10%),
/// already resolved from whatever form the caller collected them in; the
/// contribution amount is paid once per compounding period.
#[derive(Debug, Clone)]
pub struct ProjectionInput {
    pub principal: f64,
    pub annual_rate: f64,
    pub years: u32,
    pub periods_per_year: u32,
    pub annual_contribution: f64,
    pub contribution_growth_rate: f64,
}

/// One row of the annual schedule. Monetary fields are snapshots rounded to
/// cents; the engine keeps full precision between rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: u32,
    pub start_principal: f64,
    pub end_balance: f64,
    pub interest_earned: f64,
    pub period_contribution: f64,
    pub cumulative_contributions: f64,
}

/// Aggregates over the whole schedule, used for the summary block and the
/// principal/contributions/interest breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub starting_amount: f64,
    pub total_contributions: f64,
    pub total_interest: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectionResult {
    pub records: Vec<YearlyRecord>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid projection input: {0}")]
    InvalidInput(String),
}
