use clap::{Parser, Subcommand};
use log::{error, info};
use seatcast::forecast::swing::detect_swing_regions;
use seatcast::forecast::{filter_records, trend};
use seatcast::models::{HistoricalVoteRecord, Registry, ScenarioAdjustment, VoteTally};
use seatcast::{EngineConfig, ForecastRequest, ForecastRunner, RunStatus, calculate_seats};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "seatcast", about = "Proportional seat apportionment and vote-share forecasting")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Allocate seats and elect candidates from a vote tally.
    Apportion {
        /// JSON file with `registry` and `tally`.
        input: PathBuf,
    },
    /// Forecast vote shares from historical results.
    Forecast {
        /// JSON file with `records` and optional `state`, `position`, `scenario`.
        input: PathBuf,
        #[arg(long)]
        target_year: i32,
        #[arg(long)]
        iterations: Option<u32>,
        #[arg(long)]
        confidence: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List competitive regions from historical results.
    Swing {
        /// JSON file with `records` and optional `position`.
        input: PathBuf,
    },
}

#[derive(Deserialize)]
struct ApportionmentInput {
    registry: Registry,
    tally: VoteTally,
}

#[derive(Deserialize)]
struct HistoryInput {
    records: Vec<HistoricalVoteRecord>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    scenario: Option<ScenarioAdjustment>,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn read_input<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let opts = Opts::parse();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match opts.command {
        Command::Apportion { input } => apportion(&input),
        Command::Forecast {
            input,
            target_year,
            iterations,
            confidence,
            seed,
        } => {
            let config = EngineConfig {
                iterations: iterations.unwrap_or(config.iterations),
                confidence_level: confidence.unwrap_or(config.confidence_level),
                seed: seed.or(config.seed),
                ..config
            };
            forecast(&input, target_year, config).await
        }
        Command::Swing { input } => swing(&input, &config),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn apportion(input: &Path) -> CliResult<()> {
    let input: ApportionmentInput = read_input(input)?;
    let result = calculate_seats(&input.registry, &input.tally)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn forecast(input: &Path, target_year: i32, config: EngineConfig) -> CliResult<()> {
    config.validate()?;
    let input: HistoryInput = read_input(input)?;

    let mut request = ForecastRequest::new(target_year, &config);
    request.state = input.state;
    request.position = input.position;
    request.scenario = input.scenario;

    let runner = ForecastRunner::new(config.seed);
    let run = runner.spawn(input.records, request).wait().await;
    info!("Forecast run {} ended as {:?}", run.id, run.status);

    if let RunStatus::Failed { reason } = &run.status {
        return Err(reason.clone().into());
    }
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}

fn swing(input: &Path, config: &EngineConfig) -> CliResult<()> {
    let input: HistoryInput = read_input(input)?;
    let records = filter_records(&input.records, None, input.position.as_deref());
    let trends = trend::analyze_trends(&records);
    let regions = detect_swing_regions(&records, &trends, config.volatility_multiplier);
    println!("{}", serde_json::to_string_pretty(&regions)?);
    Ok(())
}
