use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{MAX_YEARS, ProjectionInput, ProjectionResult, Totals, YearlyRecord, project};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Annually,
    Quarterly,
    Monthly,
    Weekly,
    Daily,
}

impl CliFrequency {
    fn periods_per_year(self) -> u32 {
        match self {
            CliFrequency::Annually => 1,
            CliFrequency::Quarterly => 4,
            CliFrequency::Monthly => 12,
            CliFrequency::Weekly => 52,
            CliFrequency::Daily => 365,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "annual", alias = "yearly")]
    Annually,
    Quarterly,
    Monthly,
    Weekly,
    Daily,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Annually => CliFrequency::Annually,
            ApiFrequency::Quarterly => CliFrequency::Quarterly,
            ApiFrequency::Monthly => CliFrequency::Monthly,
            ApiFrequency::Weekly => CliFrequency::Weekly,
            ApiFrequency::Daily => CliFrequency::Daily,
        }
    }
}

impl From<CliFrequency> for ApiFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Annually => ApiFrequency::Annually,
            CliFrequency::Quarterly => ApiFrequency::Quarterly,
            CliFrequency::Monthly => ApiFrequency::Monthly,
            CliFrequency::Weekly => ApiFrequency::Weekly,
            CliFrequency::Daily => ApiFrequency::Daily,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    principal: Option<f64>,
    rate: Option<f64>,
    years: Option<u32>,
    frequency: Option<ApiFrequency>,
    periods_per_year: Option<u32>,
    contribution: Option<f64>,
    contribution_growth_rate: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound-interest projector (annual schedule, totals, breakdown)"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, help = "Starting principal")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Annual interest rate in percent, e.g. 10"
    )]
    rate: f64,
    #[arg(long, default_value_t = 20, help = "Number of years to project")]
    years: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliFrequency::Annually,
        help = "Compounding and contribution frequency"
    )]
    frequency: CliFrequency,
    #[arg(
        long,
        help = "Compounding periods per year; any positive integer, overrides --frequency"
    )]
    periods_per_year: Option<u32>,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Contribution paid into the balance each period"
    )]
    contribution: f64,
    #[arg(
        long,
        default_value_t = 3.14,
        help = "Annual growth of the contribution amount in percent"
    )]
    contribution_growth_rate: f64,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ProjectionInput,
    frequency: Option<ApiFrequency>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    frequency: Option<ApiFrequency>,
    periods_per_year: u32,
    records: Vec<YearlyRecord>,
    totals: Totals,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> Result<ProjectionInput, String> {
    for (name, value) in [
        ("--principal", cli.principal),
        ("--rate", cli.rate),
        ("--contribution", cli.contribution),
        ("--contribution-growth-rate", cli.contribution_growth_rate),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if cli.principal < 0.0 {
        return Err("--principal must be >= 0".to_string());
    }

    if cli.years < 1 {
        return Err("--years must be >= 1".to_string());
    }

    if cli.years > MAX_YEARS {
        return Err(format!("--years must be <= {MAX_YEARS}"));
    }

    let periods_per_year = cli
        .periods_per_year
        .unwrap_or_else(|| cli.frequency.periods_per_year());
    if periods_per_year < 1 {
        return Err("--periods-per-year must be >= 1".to_string());
    }

    if cli.contribution < 0.0 {
        return Err("--contribution must be >= 0".to_string());
    }

    if cli.contribution_growth_rate <= -100.0 {
        return Err("--contribution-growth-rate must be > -100".to_string());
    }

    Ok(ProjectionInput {
        principal: cli.principal,
        annual_rate: cli.rate,
        years: cli.years,
        periods_per_year,
        annual_contribution: cli.contribution,
        contribution_growth_rate: cli.contribution_growth_rate,
    })
}

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let frequency = match cli.periods_per_year {
        Some(_) => None,
        None => Some(cli.frequency.into()),
    };
    let inputs = build_inputs(&cli)?;
    let result = project(&inputs).map_err(|e| e.to_string())?;
    let response = build_project_response(frequency, &inputs, result);
    let json = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Compound-interest HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let result = match project(&request.inputs) {
        Ok(result) => result,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let response = build_project_response(request.frequency, &request.inputs, result);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.rate {
        cli.rate = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v.into();
    }
    if let Some(v) = payload.periods_per_year {
        cli.periods_per_year = Some(v);
    }
    if let Some(v) = payload.contribution {
        cli.contribution = v;
    }
    if let Some(v) = payload.contribution_growth_rate {
        cli.contribution_growth_rate = v;
    }

    // An explicit period count is not one of the named frequencies, so the
    // response echoes no frequency in that case.
    let frequency = match cli.periods_per_year {
        Some(_) => None,
        None => Some(cli.frequency.into()),
    };
    let inputs = build_inputs(&cli)?;
    Ok(ApiRequest { inputs, frequency })
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 10_000.0,
        rate: 10.0,
        years: 20,
        frequency: CliFrequency::Annually,
        periods_per_year: None,
        contribution: 0.0,
        contribution_growth_rate: 3.14,
    }
}

fn build_project_response(
    frequency: Option<ApiFrequency>,
    inputs: &ProjectionInput,
    result: ProjectionResult,
) -> ProjectResponse {
    ProjectResponse {
        frequency,
        periods_per_year: inputs.periods_per_year,
        records: result.records,
        totals: result.totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    #[test]
    fn build_inputs_resolves_frequency_to_period_count() {
        let mut cli = sample_cli();
        cli.frequency = CliFrequency::Monthly;

        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_eq!(inputs.periods_per_year, 12);
    }

    #[test]
    fn build_inputs_lets_an_explicit_period_count_override_the_frequency() {
        let mut cli = sample_cli();
        cli.frequency = CliFrequency::Monthly;
        cli.periods_per_year = Some(26);

        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_eq!(inputs.periods_per_year, 26);
    }

    #[test]
    fn build_inputs_rejects_zero_years() {
        let mut cli = sample_cli();
        cli.years = 0;
        let err = build_inputs(&cli).expect_err("must reject zero years");
        assert!(err.contains("--years"));
    }

    #[test]
    fn build_inputs_rejects_years_above_the_cap() {
        let mut cli = sample_cli();
        cli.years = MAX_YEARS + 1;
        let err = build_inputs(&cli).expect_err("must reject years above the cap");
        assert!(err.contains("--years"));
    }

    #[test]
    fn build_inputs_rejects_zero_periods_per_year() {
        let mut cli = sample_cli();
        cli.periods_per_year = Some(0);
        let err = build_inputs(&cli).expect_err("must reject zero periods");
        assert!(err.contains("--periods-per-year"));
    }

    #[test]
    fn build_inputs_rejects_negative_principal_and_contribution() {
        let mut cli = sample_cli();
        cli.principal = -1.0;
        let err = build_inputs(&cli).expect_err("must reject negative principal");
        assert!(err.contains("--principal"));

        let mut cli = sample_cli();
        cli.contribution = -50.0;
        let err = build_inputs(&cli).expect_err("must reject negative contribution");
        assert!(err.contains("--contribution"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_rate() {
        let mut cli = sample_cli();
        cli.rate = f64::NAN;
        let err = build_inputs(&cli).expect_err("must reject NaN rate");
        assert!(err.contains("--rate"));
    }

    #[test]
    fn build_inputs_rejects_contribution_growth_at_minus_100() {
        let mut cli = sample_cli();
        cli.contribution_growth_rate = -100.0;
        let err = build_inputs(&cli).expect_err("must reject <= -100 growth rate");
        assert!(err.contains("--contribution-growth-rate"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "principal": 2500.5,
          "rate": 4.2,
          "years": 10,
          "frequency": "weekly",
          "contribution": 50,
          "contributionGrowthRate": 2
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.principal, 2_500.5);
        assert_approx(inputs.annual_rate, 4.2);
        assert_eq!(inputs.years, 10);
        assert_eq!(inputs.periods_per_year, 52);
        assert_approx(inputs.annual_contribution, 50.0);
        assert_approx(inputs.contribution_growth_rate, 2.0);
        assert_eq!(request.frequency, Some(ApiFrequency::Weekly));
    }

    #[test]
    fn api_request_from_json_rejects_unknown_frequency() {
        let err = api_request_from_json(r#"{"frequency": "fortnightly"}"#)
            .expect_err("must reject unknown frequency");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn api_request_from_json_custom_period_count_clears_the_frequency_echo() {
        let request =
            api_request_from_json(r#"{"periodsPerYear": 26}"#).expect("json should parse");
        assert_eq!(request.frequency, None);
        assert_eq!(request.inputs.periods_per_year, 26);
    }

    #[test]
    fn empty_payload_uses_the_form_defaults() {
        let request = api_request_from_json("{}").expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.principal, 10_000.0);
        assert_approx(inputs.annual_rate, 10.0);
        assert_eq!(inputs.years, 20);
        assert_eq!(inputs.periods_per_year, 1);
        assert_approx(inputs.annual_contribution, 0.0);
        assert_approx(inputs.contribution_growth_rate, 3.14);
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = api_request_from_json(r#"{"years": 2}"#).expect("json should parse");
        let result = project(&request.inputs).expect("projection should succeed");
        let response = build_project_response(request.frequency, &request.inputs, result);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"frequency\":\"annually\""));
        assert!(json.contains("\"periodsPerYear\""));
        assert!(json.contains("\"records\""));
        assert!(json.contains("\"startPrincipal\""));
        assert!(json.contains("\"endBalance\""));
        assert!(json.contains("\"interestEarned\""));
        assert!(json.contains("\"periodContribution\""));
        assert!(json.contains("\"cumulativeContributions\""));
        assert!(json.contains("\"startingAmount\""));
        assert!(json.contains("\"totalInterest\""));
        assert!(json.contains("\"endingBalance\""));
    }

    #[test]
    fn golden_snapshot_annual_three_years_json() {
        let request = api_request_from_json(r#"{"years": 3}"#).expect("json should parse");
        let result = project(&request.inputs).expect("projection should succeed");
        let response = build_project_response(request.frequency, &request.inputs, result);
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/annual_three_years.json", &json);
    }

    #[test]
    fn golden_snapshot_quarterly_contributions_json() {
        let request = api_request_from_json(
            r#"{
              "years": 1,
              "frequency": "quarterly",
              "contribution": 100,
              "contributionGrowthRate": 0
            }"#,
        )
        .expect("json should parse");
        let result = project(&request.inputs).expect("projection should succeed");
        let response = build_project_response(request.frequency, &request.inputs, result);
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/quarterly_contributions.json", &json);
    }
}
