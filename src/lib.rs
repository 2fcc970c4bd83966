//! Seat apportionment and vote-share forecasting for proportional elections.
//!
//! Two independent pipelines live here. [`apportionment`] turns a current
//! vote tally into seats under quotient, barrier-clause and individual
//! minimum-vote rules. [`forecast`] derives per-party trends from past
//! results, optionally blends in a scenario, projects shares with a Monte
//! Carlo simulation and flags swing regions.

pub mod apportionment;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod narrative;
pub mod tasks;

pub use apportionment::{ApportionmentResult, calculate_seats};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use forecast::{CancellationFlag, ForecastReport, ForecastRequest, run_forecast};
pub use tasks::forecast_runner::{ForecastRun, ForecastRunner, RunStatus};
