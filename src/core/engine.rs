use super::types::{ProjectionError, ProjectionInput, ProjectionResult, Totals, YearlyRecord};

/// Upper bound on the simulated horizon; the loop is the only unbounded work
/// in the engine, so absurd year counts are rejected up front.
pub const MAX_YEARS: u32 = 1_000;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate(inputs: &ProjectionInput) -> Result<(), ProjectionError> {
    for (name, value) in [
        ("principal", inputs.principal),
        ("annual rate", inputs.annual_rate),
        ("contribution", inputs.annual_contribution),
        ("contribution growth rate", inputs.contribution_growth_rate),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::InvalidInput(format!(
                "{name} must be finite"
            )));
        }
    }

    if inputs.years < 1 {
        return Err(ProjectionError::InvalidInput(
            "years must be >= 1".to_string(),
        ));
    }

    if inputs.years > MAX_YEARS {
        return Err(ProjectionError::InvalidInput(format!(
            "years must be <= {MAX_YEARS}"
        )));
    }

    if inputs.periods_per_year < 1 {
        return Err(ProjectionError::InvalidInput(
            "periods per year must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Runs the year-by-year projection: the contribution is paid into the
/// balance every period, interest compounds per period at the annual rate
/// divided by the period count, and the contribution amount grows once per
/// year after that year's row is recorded.
///
/// Accumulators keep full precision across years; only the emitted row is
/// rounded to cents, half away from zero.
pub fn project(inputs: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
    validate(inputs)?;

    let mut current_balance = inputs.principal;
    let mut period_contribution = inputs.annual_contribution;
    let mut cumulative_contributions = 0.0;
    let mut start_principal = inputs.principal;

    let mut records = Vec::with_capacity(inputs.years as usize);
    for year in 1..=inputs.years {
        start_principal += period_contribution;
        let mut year_interest = 0.0;

        for _ in 0..inputs.periods_per_year {
            let period_rate = (inputs.annual_rate / 100.0) / inputs.periods_per_year as f64;
            let interest = (current_balance + period_contribution) * period_rate;
            year_interest += interest;
            current_balance += interest + period_contribution;
            cumulative_contributions += period_contribution;
        }

        records.push(YearlyRecord {
            year,
            start_principal: round2(start_principal),
            end_balance: round2(current_balance),
            interest_earned: round2(year_interest),
            period_contribution: round2(period_contribution),
            cumulative_contributions: round2(cumulative_contributions),
        });

        // The inner loop pays the contribution `periods_per_year` times but
        // the start-of-year figure absorbed only one of them before the loop;
        // the remainder is folded in here, after the row is recorded, without
        // touching the balance.
        start_principal += period_contribution * (inputs.periods_per_year - 1) as f64;
        period_contribution *= 1.0 + inputs.contribution_growth_rate / 100.0;
    }

    if !current_balance.is_finite() {
        return Err(ProjectionError::InvalidInput(
            "projection does not stay finite over the requested horizon".to_string(),
        ));
    }

    let first = &records[0];
    let last = &records[records.len() - 1];
    let totals = Totals {
        starting_amount: round2(first.start_principal - first.period_contribution),
        total_contributions: last.cumulative_contributions,
        total_interest: round2(records.iter().map(|r| r.interest_earned).sum()),
        ending_balance: last.end_balance,
    };

    Ok(ProjectionResult { records, totals })
}
