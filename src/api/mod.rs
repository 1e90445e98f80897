use axum::{
    Router,
    extract::{Json, Query, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{LoanTerms, Projection, ProjectionInputs, ProjectionMethod, project};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{flag} must be between {min} and {max}")]
    OutOfRange {
        flag: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{flag} must be >= 0")]
    NegativeAmount { flag: &'static str },
    #[error("{flag} must be a finite number")]
    NotFinite { flag: &'static str },
    #[error("Invalid API JSON payload: {0}")]
    InvalidPayload(String),
    #[error("Failed to encode projection: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliProjectionMethod {
    ClosedForm,
    Iterative,
}

impl From<CliProjectionMethod> for ProjectionMethod {
    fn from(value: CliProjectionMethod) -> Self {
        match value {
            CliProjectionMethod::ClosedForm => ProjectionMethod::ClosedForm,
            CliProjectionMethod::Iterative => ProjectionMethod::Iterative,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProjectionMethod {
    #[serde(alias = "closedForm", alias = "closed_form", alias = "closed")]
    ClosedForm,
    #[serde(alias = "iter")]
    Iterative,
}

impl From<ApiProjectionMethod> for CliProjectionMethod {
    fn from(value: ApiProjectionMethod) -> Self {
        match value {
            ApiProjectionMethod::ClosedForm => CliProjectionMethod::ClosedForm,
            ApiProjectionMethod::Iterative => CliProjectionMethod::Iterative,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    horizon_years: Option<u32>,
    property_growth: Option<f64>,

    #[serde(alias = "apt1Value")]
    retained_property_value: Option<f64>,
    #[serde(alias = "apt2Value")]
    home_value: Option<f64>,
    mortgage_principal: Option<f64>,
    mortgage_rate: Option<f64>,
    mortgage_term_years: Option<u32>,
    monthly_rent: Option<f64>,
    extra_principal: Option<f64>,

    equity_return: Option<f64>,
    monthly_contribution: Option<f64>,

    method: Option<ApiProjectionMethod>,
}

#[derive(Parser, Debug)]
#[command(
    name = "holdsell",
    about = "Two-scenario real-estate projection: keep the property and mortgage, or sell and invest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Print both scenario projections as JSON")]
    Project {
        #[command(flatten)]
        args: ProjectionArgs,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    #[command(about = "Serve the projection API over HTTP")]
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectionArgs {
    #[arg(long, default_value_t = 15, help = "Projection horizon in years")]
    horizon_years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual property appreciation in percent, shared by every property"
    )]
    property_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 1_900_000.0,
        help = "Value of the rented property that scenario 2 sells"
    )]
    retained_property_value: f64,
    #[arg(
        long,
        default_value_t = 2_300_000.0,
        help = "Value of the home kept in both scenarios"
    )]
    home_value: f64,
    #[arg(long, default_value_t = 1_700_000.0)]
    mortgage_principal: f64,
    #[arg(long, default_value_t = 4.0, help = "Mortgage annual rate in percent")]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 25)]
    mortgage_term_years: u32,
    #[arg(long, default_value_t = 4_500.0)]
    monthly_rent: f64,
    #[arg(
        long,
        help = "Extra principal paid into the mortgage each month; defaults to monthly-rent"
    )]
    extra_principal: Option<f64>,
    #[arg(
        long,
        default_value_t = 6.5,
        help = "Expected annual equity return in percent"
    )]
    equity_return: f64,
    #[arg(
        long,
        default_value_t = 7_000.0,
        help = "Monthly contribution to the equity account in scenario 2"
    )]
    monthly_contribution: f64,
    #[arg(long, value_enum, default_value_t = CliProjectionMethod::ClosedForm)]
    method: CliProjectionMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    horizon_years: u32,
    monthly_rent: f64,
    extra_principal: f64,
    #[serde(flatten)]
    projection: Projection,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn check_range(flag: &'static str, value: f64, min: f64, max: f64) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::OutOfRange { flag, min, max })
    }
}

fn check_amount(flag: &'static str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() {
        return Err(ApiError::NotFinite { flag });
    }
    if value < 0.0 {
        return Err(ApiError::NegativeAmount { flag });
    }
    Ok(())
}

fn build_inputs(args: ProjectionArgs) -> Result<ProjectionInputs, ApiError> {
    check_range("--horizon-years", args.horizon_years as f64, 1.0, 50.0)?;
    check_range("--property-growth-rate", args.property_growth_rate, 0.0, 20.0)?;
    check_range("--mortgage-rate", args.mortgage_rate, 0.0, 30.0)?;
    check_range("--mortgage-term-years", args.mortgage_term_years as f64, 1.0, 40.0)?;
    check_range("--equity-return", args.equity_return, 0.0, 50.0)?;

    let extra_principal = args.extra_principal.unwrap_or(args.monthly_rent);
    for (flag, amount) in [
        ("--retained-property-value", args.retained_property_value),
        ("--home-value", args.home_value),
        ("--mortgage-principal", args.mortgage_principal),
        ("--monthly-rent", args.monthly_rent),
        ("--extra-principal", extra_principal),
        ("--monthly-contribution", args.monthly_contribution),
    ] {
        check_amount(flag, amount)?;
    }

    Ok(ProjectionInputs {
        horizon_years: args.horizon_years,
        property_growth: args.property_growth_rate / 100.0,
        retained_property_value: args.retained_property_value,
        home_value: args.home_value,
        loan: LoanTerms {
            principal: args.mortgage_principal,
            annual_rate: args.mortgage_rate / 100.0,
            term_years: args.mortgage_term_years,
        },
        monthly_rent: args.monthly_rent,
        extra_principal_monthly: extra_principal,
        equity_return: args.equity_return / 100.0,
        monthly_contribution: args.monthly_contribution,
        method: args.method.into(),
    })
}

fn build_project_response(inputs: &ProjectionInputs) -> ProjectResponse {
    ProjectResponse {
        horizon_years: inputs.horizon_years,
        monthly_rent: inputs.monthly_rent,
        extra_principal: inputs.extra_principal_monthly,
        projection: project(inputs),
    }
}

pub fn render_projection(args: ProjectionArgs, pretty: bool) -> Result<String, ApiError> {
    let inputs = build_inputs(args)?;
    let response = build_project_response(&inputs);
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    Ok(json)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("projection API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(query: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    project_query_response(query)
}

fn project_query_response(query: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match query {
        Ok(Query(payload)) => project_response(payload),
        Err(rejection) => {
            let e = ApiError::InvalidPayload(rejection.body_text());
            warn!("rejected projection request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn project_post_handler(body: String) -> Response {
    if body.trim().is_empty() {
        return project_response(ProjectPayload::default());
    }
    match payload_from_json(&body) {
        Ok(payload) => project_response(payload),
        Err(e) => {
            warn!("rejected projection request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn project_response(payload: ProjectPayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!("rejected projection request: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    debug!(
        "projecting {} years, method {:?}",
        inputs.horizon_years, inputs.method
    );
    json_response(StatusCode::OK, build_project_response(&inputs))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

fn payload_from_json(json: &str) -> Result<ProjectPayload, ApiError> {
    serde_json::from_str::<ProjectPayload>(json).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

fn inputs_from_payload(payload: ProjectPayload) -> Result<ProjectionInputs, ApiError> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.horizon_years {
        args.horizon_years = v;
    }
    if let Some(v) = payload.property_growth {
        args.property_growth_rate = v;
    }

    if let Some(v) = payload.retained_property_value {
        args.retained_property_value = v;
    }
    if let Some(v) = payload.home_value {
        args.home_value = v;
    }
    if let Some(v) = payload.mortgage_principal {
        args.mortgage_principal = v;
    }
    if let Some(v) = payload.mortgage_rate {
        args.mortgage_rate = v;
    }
    if let Some(v) = payload.mortgage_term_years {
        args.mortgage_term_years = v;
    }
    if let Some(v) = payload.monthly_rent {
        args.monthly_rent = v;
    }
    if let Some(v) = payload.extra_principal {
        args.extra_principal = Some(v);
    }

    if let Some(v) = payload.equity_return {
        args.equity_return = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }

    if let Some(v) = payload.method {
        args.method = v.into();
    }

    build_inputs(args)
}

fn default_args_for_api() -> ProjectionArgs {
    ProjectionArgs {
        horizon_years: 15,
        property_growth_rate: 3.0,
        retained_property_value: 1_900_000.0,
        home_value: 2_300_000.0,
        mortgage_principal: 1_700_000.0,
        mortgage_rate: 4.0,
        mortgage_term_years: 25,
        monthly_rent: 4_500.0,
        extra_principal: None,
        equity_return: 6.5,
        monthly_contribution: 7_000.0,
        method: CliProjectionMethod::ClosedForm,
    }
}
