use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    DEFAULT_SAMPLE_PATHS, DistributionSummary, PercentileRow, SeededNormal, SimulationConfig,
    TrajectoryBand, distribution_summary, percentile_table, run_simulation, sample_path_indices,
    sample_trajectories, success_rate, terminal_real_values, trajectory_band,
};
use crate::report::{LocaleSpec, render_text_report};

const MAX_SIMULATIONS: u32 = 1_000_000;
const BAND_LOWER_RANK: u32 = 10;
const BAND_UPPER_RANK: u32 = 90;

/// Simulation parameters as users supply them: rates in percent, horizon as
/// an age range, withdrawal as an initial rate on the starting portfolio.
/// Defaults match the interactive tool this replaces.
#[derive(clap::Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 2_200_000.0, help = "Starting portfolio value")]
    initial_investment: f64,
    #[arg(long, default_value_t = 6.0, help = "Expected annual return in percent")]
    annual_return: f64,
    #[arg(long, default_value_t = 1.0, help = "Annual return volatility in percent")]
    return_volatility: f64,
    #[arg(long, default_value_t = 50)]
    current_age: u32,
    #[arg(
        long,
        default_value_t = 100,
        help = "Simulation horizon runs from current age to this age"
    )]
    life_expectancy: u32,
    #[arg(
        long,
        default_value_t = 2.7,
        help = "Initial withdrawal rate in percent of the initial investment"
    )]
    withdrawal_rate: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual inflation in percent; drives withdrawal growth"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 3.0, help = "Inflation volatility in percent")]
    inflation_volatility: f64,
    #[arg(long, default_value_t = 100_000, help = "Number of simulated paths")]
    simulations: u32,
    #[arg(long, help = "Seed for a reproducible run; random when omitted")]
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_investment: Option<f64>,
    annual_return: Option<f64>,
    return_volatility: Option<f64>,
    current_age: Option<u32>,
    life_expectancy: Option<u32>,
    withdrawal_rate: Option<f64>,
    inflation_rate: Option<f64>,
    inflation_volatility: Option<f64>,
    simulations: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    initial_investment: f64,
    annual_withdrawal: f64,
    years: usize,
    paths: usize,
    seed: u64,
    success_rate: f64,
    nominal: DistributionSummary,
    real: DistributionSummary,
    percentiles: Vec<PercentileRow>,
    trajectories: TrajectoryResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrajectoryResponse {
    band: TrajectoryBand,
    sample_paths: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_args() -> SimulateArgs {
    #[derive(Parser)]
    struct Defaults {
        #[command(flatten)]
        args: SimulateArgs,
    }
    Defaults::parse_from(["nestegg"]).args
}

fn args_from_payload(payload: SimulatePayload) -> SimulateArgs {
    let mut args = default_args();
    if let Some(v) = payload.initial_investment {
        args.initial_investment = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.return_volatility {
        args.return_volatility = v;
    }
    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        args.life_expectancy = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.inflation_volatility {
        args.inflation_volatility = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.seed {
        args.seed = Some(v);
    }
    args
}

fn config_from_args(args: &SimulateArgs) -> Result<SimulationConfig, String> {
    if args.life_expectancy <= args.current_age {
        return Err("--life-expectancy must be greater than --current-age".to_string());
    }
    if args.simulations == 0 {
        return Err("--simulations must be at least 1".to_string());
    }
    if args.simulations > MAX_SIMULATIONS {
        return Err(format!("--simulations must be at most {MAX_SIMULATIONS}"));
    }
    if args.withdrawal_rate < 0.0 {
        return Err("--withdrawal-rate must be >= 0".to_string());
    }

    let config = SimulationConfig {
        initial_investment: args.initial_investment,
        returns_mean: args.annual_return / 100.0,
        returns_std: args.return_volatility / 100.0,
        years: (args.life_expectancy - args.current_age) as usize,
        paths: args.simulations as usize,
        initial_withdrawal: args.initial_investment * args.withdrawal_rate / 100.0,
        inflation_mean: args.inflation_rate / 100.0,
        inflation_std: args.inflation_volatility / 100.0,
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn source_for(seed: Option<u64>) -> SeededNormal {
    match seed {
        Some(seed) => SeededNormal::from_seed(seed),
        None => SeededNormal::from_entropy(),
    }
}

/// Runs one simulation from CLI arguments and renders the text report.
pub fn run_cli_simulation(args: &SimulateArgs, locale: &LocaleSpec) -> Result<String, String> {
    let config = config_from_args(args)?;
    let mut source = source_for(args.seed);
    info!(
        seed = source.seed(),
        years = config.years,
        paths = config.paths,
        "running simulation"
    );

    let started = Instant::now();
    let result = run_simulation(&config, &mut source).map_err(|e| e.to_string())?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );

    Ok(render_text_report(&config, &result, locale))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "simulation API listening");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    "nestegg simulation API\n\nGET|POST /api/simulate - run a Monte Carlo retirement simulation\n"
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let args = args_from_payload(payload);
    let config = match config_from_args(&args) {
        Ok(config) => config,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let mut source = source_for(args.seed);
    let seed = source.seed();
    let started = Instant::now();
    let result = match run_simulation(&config, &mut source) {
        Ok(result) => result,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    info!(
        seed,
        years = config.years,
        paths = config.paths,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );

    // The subsample stream is derived from the run seed so a seeded request
    // reproduces the whole response, trajectories included.
    let mut pick_rng = StdRng::seed_from_u64(splitmix64(seed));
    let indices = sample_path_indices(result.paths(), DEFAULT_SAMPLE_PATHS, &mut pick_rng);

    let real_values = terminal_real_values(&result);
    let response = SimulateResponse {
        initial_investment: config.initial_investment,
        annual_withdrawal: config.initial_withdrawal,
        years: result.years(),
        paths: result.paths(),
        seed,
        success_rate: success_rate(&result),
        nominal: distribution_summary(result.terminal_values()),
        real: distribution_summary(&real_values),
        percentiles: percentile_table(&result),
        trajectories: TrajectoryResponse {
            band: trajectory_band(&result, &indices, BAND_LOWER_RANK, BAND_UPPER_RANK),
            sample_paths: sample_trajectories(&result, &indices),
        },
    };

    json_response(StatusCode::OK, response)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
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
fn args_from_json(json: &str) -> Result<SimulateArgs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(args_from_payload(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_match_the_interactive_tool() {
        let config = config_from_args(&default_args()).unwrap();
        assert_eq!(config.initial_investment, 2_200_000.0);
        assert_eq!(config.returns_mean, 0.06);
        assert_eq!(config.returns_std, 0.01);
        assert_eq!(config.years, 50);
        assert_eq!(config.paths, 100_000);
        assert!((config.initial_withdrawal - 59_400.0).abs() < 1e-9);
        assert_eq!(config.inflation_mean, 0.03);
        assert_eq!(config.inflation_std, 0.03);
    }

    #[test]
    fn payload_fields_override_defaults() {
        let args = args_from_json(
            r#"{
                "initialInvestment": 500000,
                "annualReturn": 4.5,
                "currentAge": 60,
                "lifeExpectancy": 95,
                "withdrawalRate": 4.0,
                "simulations": 10000,
                "seed": 99
            }"#,
        )
        .unwrap();
        let config = config_from_args(&args).unwrap();

        assert_eq!(config.initial_investment, 500_000.0);
        assert_eq!(config.returns_mean, 0.045);
        assert_eq!(config.years, 35);
        assert_eq!(config.paths, 10_000);
        assert!((config.initial_withdrawal - 20_000.0).abs() < 1e-9);
        // Untouched fields keep their defaults.
        assert_eq!(config.inflation_mean, 0.03);
        assert_eq!(args.seed, Some(99));
    }

    #[test]
    fn horizon_must_be_at_least_one_year() {
        let mut args = default_args();
        args.current_age = 70;
        args.life_expectancy = 70;
        let err = config_from_args(&args).unwrap_err();
        assert!(err.contains("--life-expectancy"));
    }

    #[test]
    fn simulation_count_bounds_are_enforced() {
        let mut args = default_args();
        args.simulations = 0;
        assert!(config_from_args(&args).unwrap_err().contains("at least 1"));

        args.simulations = MAX_SIMULATIONS + 1;
        assert!(config_from_args(&args).unwrap_err().contains("at most"));
    }

    #[test]
    fn core_validation_errors_surface_as_messages() {
        let mut args = default_args();
        args.return_volatility = -1.0;
        let err = config_from_args(&args).unwrap_err();
        assert!(err.contains("return volatility"));

        let mut args = default_args();
        args.initial_investment = -100.0;
        let err = config_from_args(&args).unwrap_err();
        assert!(err.contains("initial investment"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = args_from_json("{ not json").unwrap_err();
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn cli_run_produces_a_report() {
        let mut args = default_args();
        args.simulations = 500;
        args.seed = Some(7);
        let report = run_cli_simulation(&args, &LocaleSpec::en_us()).unwrap();
        assert!(report.contains("Success rate:"));
        assert!(report.contains("50 years, 500 paths"));
    }

    #[test]
    fn seeded_cli_runs_are_reproducible() {
        let mut args = default_args();
        args.simulations = 200;
        args.seed = Some(1234);
        let first = run_cli_simulation(&args, &LocaleSpec::en_us()).unwrap();
        let second = run_cli_simulation(&args, &LocaleSpec::en_us()).unwrap();
        assert_eq!(first, second);
    }
}
