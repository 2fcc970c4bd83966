pub mod monte_carlo;
pub mod scenario;
pub mod swing;
pub mod trend;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{HistoricalVoteRecord, ScenarioAdjustment};
use log::{debug, info, warn};
use monte_carlo::{MonteCarloResult, MonteCarloSimulator, SimulationParams};
use rand::Rng;
use scenario::{AdjustedScenario, apply_scenario};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use swing::{SwingRegion, detect_swing_regions};

const RISING_SLOPE: f64 = 0.5;
const FALLING_SLOPE: f64 = -0.5;
const MIN_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > RISING_SLOPE {
            TrendDirection::Rising
        } else if slope < FALLING_SLOPE {
            TrendDirection::Falling
        } else {
            TrendDirection::Stable
        }
    }
}

// Shared flag checked between per-party simulations.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub target_year: i32,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    pub iterations: u32,
    pub confidence_level: f64,
    pub poll_weight: f64,
    pub volatility_multiplier: f64,
    #[serde(default)]
    pub scenario: Option<ScenarioAdjustment>,
}

impl ForecastRequest {
    pub fn new(target_year: i32, config: &EngineConfig) -> Self {
        Self {
            target_year,
            state: None,
            position: None,
            iterations: config.iterations,
            confidence_level: config.confidence_level,
            poll_weight: config.poll_weight,
            volatility_multiplier: config.volatility_multiplier,
            scenario: None,
        }
    }

    fn has_scenario(&self) -> bool {
        self.scenario.as_ref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub party: String,
    pub predicted_vote_share: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub trend_direction: TrendDirection,
    pub confidence: f64,
    pub influence_factors: Vec<String>,
    pub simulation: MonteCarloResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub target_year: i32,
    pub records_used: usize,
    pub volatility_multiplier: f64,
    pub scenario_applied: bool,
    // Predicted shares were rescaled to sum to 100.
    pub normalized: bool,
    pub results: Vec<ForecastResult>,
    pub swing_regions: Vec<SwingRegion>,
    pub warnings: Vec<String>,
}

impl ForecastReport {
    pub fn total_predicted_share(&self) -> f64 {
        self.results.iter().map(|r| r.predicted_vote_share).sum()
    }

    pub fn result_for(&self, party: &str) -> Option<&ForecastResult> {
        self.results.iter().find(|r| r.party == party)
    }
}

pub fn filter_records(
    records: &[HistoricalVoteRecord],
    state: Option<&str>,
    position: Option<&str>,
) -> Vec<HistoricalVoteRecord> {
    records
        .iter()
        .filter(|r| state.is_none_or(|s| r.state == s))
        .filter(|r| position.is_none_or(|p| r.position == p))
        .cloned()
        .collect()
}

// `1 - (stdev / mean) * 0.5`, never below 0.3.
pub fn forecast_confidence(std_dev: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        return MIN_CONFIDENCE;
    }
    (1.0 - (std_dev / mean) * 0.5).clamp(MIN_CONFIDENCE, 1.0)
}

// Project every party's share to `request.target_year`.
// Trend analysis runs over records matching the request's state and
// position; swing detection runs over every state for that position.
// `cancel` is checked before each party's simulation.
pub fn run_forecast<R: Rng>(
    records: &[HistoricalVoteRecord],
    request: &ForecastRequest,
    simulator: &mut MonteCarloSimulator<R>,
    cancel: &CancellationFlag,
) -> Result<ForecastReport> {
    // Nothing to project from, nothing simulated
    let filtered = filter_records(records, request.state.as_deref(), request.position.as_deref());
    if filtered.is_empty() {
        return Err(EngineError::InsufficientHistoricalData(format!(
            "no historical records for state {} and position {}",
            request.state.as_deref().unwrap_or("(any)"),
            request.position.as_deref().unwrap_or("(any)")
        )));
    }

    info!(
        "Forecasting {} from {} historical records",
        request.target_year,
        filtered.len()
    );

    // Trends, then the scenario on top of them
    let trends = trend::analyze_trends(&filtered);
    let scenario_applied = request.has_scenario();
    let adjusted = match request.scenario.as_ref().filter(|_| scenario_applied) {
        Some(scenario) => apply_scenario(trends, scenario, request.poll_weight, request.volatility_multiplier)?,
        None => AdjustedScenario::unadjusted(trends, request.volatility_multiplier),
    };
    let multiplier = adjusted.volatility_multiplier;

    let mut warnings = Vec::new();
    let mut results = Vec::with_capacity(adjusted.trends.len());

    for (party, trend) in &adjusted.trends {
        // Checked between parties only; a started simulation runs to the end
        if cancel.is_cancelled() {
            info!("Forecast cancelled before simulating {}", party);
            return Err(EngineError::Cancelled);
        }

        let last_year = trend.last_year().unwrap_or(request.target_year);
        let raw_delta = request.target_year - last_year;
        let years_delta = if raw_delta <= 0 {
            let message = format!(
                "{}: target year {} is not after the last election ({}); projecting one year ahead",
                party, request.target_year, last_year
            );
            warn!("{}", message);
            warnings.push(message);
            1
        } else {
            raw_delta
        };

        // Uncertainty grows with the square root of the horizon
        let adjusted_volatility = trend.volatility * multiplier * (years_delta as f64).sqrt();
        // Scenarios shift inside the simulation, baselines are projected up front
        let params = if scenario_applied {
            SimulationParams::new(trend.last_share(), adjusted_volatility, request.iterations, request.confidence_level)
                .with_trend(trend.trend_slope)
        } else {
            let projection = trend.last_share() + trend.trend_slope * years_delta as f64;
            SimulationParams::new(projection, adjusted_volatility, request.iterations, request.confidence_level)
        };

        let simulation = simulator.simulate(&params)?;
        debug!(
            "{}: mean {:.2}, interval [{:.2}, {:.2}]",
            party, simulation.mean, simulation.lower, simulation.upper
        );

        let mut influence_factors = vec![
            format!(
                "Historical trend of {:+.2} points per year over {} election(s)",
                trend.trend_slope,
                trend.historical_share.len()
            ),
            format!(
                "Volatility {:.2} scaled to {:.2} over {} year(s)",
                trend.volatility, adjusted_volatility, years_delta
            ),
        ];
        if let Some(notes) = adjusted.influences.get(party) {
            influence_factors.extend(notes.iter().cloned());
        }
        influence_factors.extend(adjusted.global_influences.iter().cloned());

        results.push(ForecastResult {
            party: party.clone(),
            predicted_vote_share: simulation.mean,
            lower_bound: simulation.lower,
            upper_bound: simulation.upper,
            trend_direction: TrendDirection::from_slope(trend.trend_slope),
            confidence: forecast_confidence(simulation.std_dev, simulation.mean),
            influence_factors,
            simulation,
        });
    }

    // Scenario shares are rescaled to 100, bounds with them
    let mut normalized = false;
    if scenario_applied {
        let total: f64 = results.iter().map(|r| r.predicted_vote_share).sum();
        if total > 0.0 {
            let scale = 100.0 / total;
            for result in &mut results {
                result.predicted_vote_share *= scale;
                result.lower_bound *= scale;
                result.upper_bound *= scale;
            }
            normalized = true;
        } else {
            let message = "All predicted shares are zero; normalisation skipped".to_string();
            warn!("{}", message);
            warnings.push(message);
        }
    }

    // Swing detection looks across every state for the position
    let regional = filter_records(records, None, request.position.as_deref());
    let swing_regions = detect_swing_regions(&regional, &adjusted.trends, multiplier);

    info!(
        "Forecast for {} finished: {} parties, {} swing region(s)",
        request.target_year,
        results.len(),
        swing_regions.iter().filter(|r| r.is_swing).count()
    );

    Ok(ForecastReport {
        target_year: request.target_year,
        records_used: filtered.len(),
        volatility_multiplier: multiplier,
        scenario_applied,
        normalized,
        results,
        swing_regions,
        warnings,
    })
}
