use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    Advisory, ComparisonResult, DEFAULT_DURATIONS, DEFAULT_PRICE_STEP, ModelConfig, ParamError,
    PriceSeries, RentVsBuy, SearchConfig, SimulationParameters, advise, compare_rent_vs_buy,
    compare_strategies, optimize,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptimizePayload {
    income: Option<f64>,
    borrowing_rate: Option<f64>,
    investment_return: Option<f64>,
    inflation: Option<f64>,
    available_capital: Option<f64>,
    invested_capital: Option<f64>,

    notary_fee_rate: Option<f64>,
    maintenance_rate: Option<f64>,
    loan_insurance_rate: Option<f64>,
    property_tax_rate: Option<f64>,
    condo_fee_per_sqm: Option<f64>,
    home_insurance: Option<f64>,
    dwelling_area: Option<f64>,

    monthly_rent: Option<f64>,
    comparison_duration_years: Option<u32>,
    comparison_price: Option<f64>,

    price_min: Option<f64>,
    price_max: Option<f64>,
    price_step: Option<f64>,
    /// Comma separated, e.g. `"10,20,25"`.
    durations: Option<String>,

    affordability_percent: Option<f64>,
    allocation_percent: Option<f64>,
    down_payment_cap_percent: Option<f64>,
    appreciation_premium: Option<f64>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "wealth-optimizer",
    about = "Grid search over purchase price and loan duration: down payment or invest?"
)]
struct Cli {
    #[arg(long, default_value_t = 5_000.0, help = "Net monthly income")]
    income: f64,
    #[arg(long, default_value_t = 2.8, help = "Mortgage rate in percent")]
    borrowing_rate: f64,
    #[arg(long, default_value_t = 6.0, help = "Annual investment return in percent")]
    investment_return: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual inflation in percent")]
    inflation: f64,
    #[arg(
        long,
        default_value_t = 18_000.0,
        help = "Cash that may be used as a down payment"
    )]
    available_capital: f64,
    #[arg(
        long,
        default_value_t = 42_000.0,
        help = "Capital already invested and left untouched"
    )]
    invested_capital: f64,
    #[arg(long, default_value_t = 8.0, help = "Acquisition fees in percent of price")]
    notary_fee_rate: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Yearly maintenance in percent of price"
    )]
    maintenance_rate: f64,
    #[arg(
        long,
        default_value_t = 0.3,
        help = "Yearly loan insurance in percent of principal"
    )]
    loan_insurance_rate: f64,
    #[arg(
        long,
        default_value_t = 1.2,
        help = "Yearly property tax in percent of price"
    )]
    property_tax_rate: f64,
    #[arg(long, default_value_t = 3.5, help = "Condo fees per square metre per month")]
    condo_fee_per_sqm: f64,
    #[arg(long, default_value_t = 45.0, help = "Home insurance per month")]
    home_insurance: f64,
    #[arg(long, default_value_t = 60.0, help = "Dwelling area in square metres")]
    dwelling_area: f64,
    #[arg(long, default_value_t = 1_000.0, help = "Rent of an equivalent home")]
    monthly_rent: f64,
    #[arg(long, default_value_t = 20, help = "Loan duration used for rent vs buy")]
    comparison_duration: u32,
    #[arg(long, default_value_t = 200_000.0, help = "Price used for rent vs buy")]
    comparison_price: f64,
    #[arg(long, default_value_t = 150_000.0)]
    price_min: f64,
    #[arg(long, default_value_t = 300_000.0)]
    price_max: f64,
    #[arg(long, default_value_t = DEFAULT_PRICE_STEP)]
    price_step: f64,
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = DEFAULT_DURATIONS.to_vec(),
        help = "Loan durations in years"
    )]
    durations: Vec<u32>,
    #[arg(
        long,
        default_value_t = 40.0,
        help = "Share of income ownership costs may take, in percent"
    )]
    affordability_percent: f64,
    #[arg(
        long,
        default_value_t = 80.0,
        help = "Share of the leftover capacity invested each month, in percent"
    )]
    allocation_percent: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Largest down payment in percent of price"
    )]
    down_payment_cap_percent: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Property appreciation above inflation, in percent"
    )]
    appreciation_premium: f64,
    #[arg(
        long,
        default_value_t = false,
        help = "Only compare the strategies at --comparison-price and --comparison-duration"
    )]
    compare_only: bool,
}

#[derive(Debug, Clone)]
struct ApiRequest {
    params: SimulationParameters,
    model: ModelConfig,
    search: SearchConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeResponse {
    params: SimulationParameters,
    model: ModelConfig,
    search: SearchConfig,
    advisory: Advisory,
    best: Option<ComparisonResult>,
    results: Vec<ComparisonResult>,
    series: Vec<PriceSeries>,
    rent_vs_buy: RentVsBuy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    params: SimulationParameters,
    model: ModelConfig,
    advisory: Advisory,
    comparison: Option<ComparisonResult>,
    rent_vs_buy: RentVsBuy,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_request(cli: Cli) -> Result<ApiRequest, ParamError> {
    for (field, value) in [
        ("affordabilityPercent", cli.affordability_percent),
        ("allocationPercent", cli.allocation_percent),
        ("downPaymentCapPercent", cli.down_payment_cap_percent),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ParamError::OutOfRange { field, max: 100.0 });
        }
    }

    let params = SimulationParameters {
        monthly_income: cli.income,
        borrowing_rate: cli.borrowing_rate,
        investment_return: cli.investment_return,
        inflation: cli.inflation,
        available_capital: cli.available_capital,
        invested_capital: cli.invested_capital,
        notary_fee_rate: cli.notary_fee_rate,
        maintenance_rate: cli.maintenance_rate,
        loan_insurance_rate: cli.loan_insurance_rate,
        property_tax_rate: cli.property_tax_rate,
        condo_fee_per_sqm: cli.condo_fee_per_sqm,
        home_insurance: cli.home_insurance,
        dwelling_area: cli.dwelling_area,
        monthly_rent: cli.monthly_rent,
        comparison_duration_years: cli.comparison_duration,
        comparison_price: cli.comparison_price,
        price_min: cli.price_min,
        price_max: cli.price_max,
    };
    let model = ModelConfig {
        affordability_ratio: cli.affordability_percent / 100.0,
        investment_allocation: cli.allocation_percent / 100.0,
        down_payment_cap: cli.down_payment_cap_percent / 100.0,
        appreciation_premium: cli.appreciation_premium,
    };
    let search = SearchConfig {
        price_step: cli.price_step,
        durations: cli.durations,
    };

    Ok(ApiRequest {
        params,
        model,
        search,
    })
}

/// Parses the command line, runs the engine and returns the report as pretty JSON.
pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let compare_only = cli.compare_only;
    let request = build_request(cli).map_err(|e| e.to_string())?;

    let json = if compare_only {
        let response = build_compare_response(&request).map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&response)
    } else {
        let response = build_optimize_response(&request).map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&response)
    };
    json.map_err(|e| format!("Failed to serialize report: {e}"))
}

fn app() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/optimize",
            get(optimize_get_handler).post(optimize_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Wealth optimizer API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/optimize");

    axum::serve(listener, app()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn optimize_get_handler(Query(payload): Query<OptimizePayload>) -> Response {
    optimize_handler_impl(payload).await
}

async fn optimize_post_handler(Json(payload): Json<OptimizePayload>) -> Response {
    optimize_handler_impl(payload).await
}

async fn compare_get_handler(Query(payload): Query<OptimizePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_post_handler(Json(payload): Json<OptimizePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn optimize_handler_impl(payload: OptimizePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected optimize request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match build_optimize_response(&request) {
        Ok(response) => {
            info!(
                feasible = response.results.len(),
                price_min = request.params.price_min,
                price_max = request.params.price_max,
                "optimize request served"
            );
            json_response(StatusCode::OK, response)
        }
        Err(e) => {
            warn!(error = %e, "rejected optimize request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn compare_handler_impl(payload: OptimizePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "rejected compare request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match build_compare_response(&request) {
        Ok(response) => {
            info!(
                price = request.params.comparison_price,
                years = request.params.comparison_duration_years,
                feasible = response.comparison.is_some(),
                "compare request served"
            );
            json_response(StatusCode::OK, response)
        }
        Err(e) => {
            warn!(error = %e, "rejected compare request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
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

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<OptimizePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: OptimizePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.income {
        cli.income = v;
    }
    if let Some(v) = payload.borrowing_rate {
        cli.borrowing_rate = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }
    if let Some(v) = payload.available_capital {
        cli.available_capital = v;
    }
    if let Some(v) = payload.invested_capital {
        cli.invested_capital = v;
    }

    if let Some(v) = payload.notary_fee_rate {
        cli.notary_fee_rate = v;
    }
    if let Some(v) = payload.maintenance_rate {
        cli.maintenance_rate = v;
    }
    if let Some(v) = payload.loan_insurance_rate {
        cli.loan_insurance_rate = v;
    }
    if let Some(v) = payload.property_tax_rate {
        cli.property_tax_rate = v;
    }
    if let Some(v) = payload.condo_fee_per_sqm {
        cli.condo_fee_per_sqm = v;
    }
    if let Some(v) = payload.home_insurance {
        cli.home_insurance = v;
    }
    if let Some(v) = payload.dwelling_area {
        cli.dwelling_area = v;
    }

    if let Some(v) = payload.monthly_rent {
        cli.monthly_rent = v;
    }
    if let Some(v) = payload.comparison_duration_years {
        cli.comparison_duration = v;
    }
    if let Some(v) = payload.comparison_price {
        cli.comparison_price = v;
    }

    if let Some(v) = payload.price_min {
        cli.price_min = v;
    }
    if let Some(v) = payload.price_max {
        cli.price_max = v;
    }
    if let Some(v) = payload.price_step {
        cli.price_step = v;
    }
    if let Some(v) = payload.durations {
        cli.durations = parse_durations(&v)?;
    }

    if let Some(v) = payload.affordability_percent {
        cli.affordability_percent = v;
    }
    if let Some(v) = payload.allocation_percent {
        cli.allocation_percent = v;
    }
    if let Some(v) = payload.down_payment_cap_percent {
        cli.down_payment_cap_percent = v;
    }
    if let Some(v) = payload.appreciation_premium {
        cli.appreciation_premium = v;
    }

    build_request(cli).map_err(|e| e.to_string())
}

fn parse_durations(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| format!("durations must be whole years, got {s:?}"))
        })
        .collect()
}

fn default_cli_for_api() -> Cli {
    Cli {
        income: 5_000.0,
        borrowing_rate: 2.8,
        investment_return: 6.0,
        inflation: 2.0,
        available_capital: 18_000.0,
        invested_capital: 42_000.0,
        notary_fee_rate: 8.0,
        maintenance_rate: 1.0,
        loan_insurance_rate: 0.3,
        property_tax_rate: 1.2,
        condo_fee_per_sqm: 3.5,
        home_insurance: 45.0,
        dwelling_area: 60.0,
        monthly_rent: 1_000.0,
        comparison_duration: 20,
        comparison_price: 200_000.0,
        price_min: 150_000.0,
        price_max: 300_000.0,
        price_step: DEFAULT_PRICE_STEP,
        durations: DEFAULT_DURATIONS.to_vec(),
        affordability_percent: 40.0,
        allocation_percent: 80.0,
        down_payment_cap_percent: 20.0,
        appreciation_premium: 1.5,
        compare_only: false,
    }
}

fn build_optimize_response(request: &ApiRequest) -> Result<OptimizeResponse, ParamError> {
    let params = &request.params;
    let result = optimize(params, &request.model, &request.search)?;
    Ok(OptimizeResponse {
        params: params.clone(),
        model: request.model,
        search: request.search.clone(),
        advisory: advise(params.investment_return, params.borrowing_rate),
        best: result.best().cloned(),
        rent_vs_buy: compare_rent_vs_buy(params, &request.model),
        results: result.ranked,
        series: result.series,
    })
}

/// The search config is not used here, so only the parameters and the model
/// are checked.
fn build_compare_response(request: &ApiRequest) -> Result<CompareResponse, ParamError> {
    let params = &request.params;
    params.validate()?;
    request.model.validate()?;
    Ok(CompareResponse {
        params: params.clone(),
        model: request.model,
        advisory: advise(params.investment_return, params.borrowing_rate),
        comparison: compare_strategies(
            params.comparison_price,
            params.comparison_duration_years,
            params,
            &request.model,
        ),
        rent_vs_buy: compare_rent_vs_buy(params, &request.model),
    })
}
