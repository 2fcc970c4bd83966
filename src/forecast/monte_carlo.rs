use crate::error::{EngineError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const DEFAULT_MAX_SHARE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub base_value: f64,
    pub volatility: f64,
    pub trend_adjustment: f64,
    pub iterations: u32,
    pub confidence_level: f64,
    pub max_share: f64,
}

impl SimulationParams {
    pub fn new(base_value: f64, volatility: f64, iterations: u32, confidence_level: f64) -> Self {
        Self {
            base_value,
            volatility,
            trend_adjustment: 0.0,
            iterations,
            confidence_level,
            max_share: DEFAULT_MAX_SHARE,
        }
    }

    pub fn with_trend(mut self, trend_adjustment: f64) -> Self {
        self.trend_adjustment = trend_adjustment;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(EngineError::InvalidParameter(
                "iteration count must be at least 1".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EngineError::InvalidParameter(format!(
                "confidence level {} is not inside (0, 1)",
                self.confidence_level
            )));
        }
        if !(self.max_share > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "maximum share {} must be positive",
                self.max_share
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    // Sorted ascending.
    #[serde(skip_serializing, default)]
    pub samples: Vec<f64>,
    pub iterations: u32,
    pub mean: f64,
    pub median: f64,
    pub lower: f64,
    pub upper: f64,
    pub std_dev: f64,
}

// Box-Muller sampler over an owned RNG.
pub struct MonteCarloSimulator<R: Rng> {
    rng: R,
}

impl MonteCarloSimulator<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> MonteCarloSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn standard_normal(&mut self) -> f64 {
        // gen() is in [0, 1); flip it so ln never sees zero.
        let u1: f64 = 1.0 - self.rng.r#gen::<f64>();
        let u2: f64 = self.rng.r#gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    pub fn simulate(&mut self, params: &SimulationParams) -> Result<MonteCarloResult> {
        params.validate()?;

        let center = params.base_value + params.trend_adjustment;
        let mut samples: Vec<f64> = (0..params.iterations)
            .map(|_| {
                let z = self.standard_normal();
                (center + params.volatility * z).clamp(0.0, params.max_share)
            })
            .collect();
        samples.sort_by(|a, b| a.total_cmp(b));

        Ok(summarize(samples, params.confidence_level, params.iterations))
    }
}

fn summarize(samples: Vec<f64>, confidence_level: f64, iterations: u32) -> MonteCarloResult {
    let n = samples.len();
    let last = n - 1;
    let tail = (1.0 - confidence_level) / 2.0;

    let mean = samples.iter().sum::<f64>() / n as f64;
    let median = samples[n / 2];
    let lower_index = ((n as f64 * tail).floor() as usize).min(last);
    let upper_index = ((n as f64 * (1.0 - tail)).floor() as usize).min(last);
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

    MonteCarloResult {
        lower: samples[lower_index],
        upper: samples[upper_index],
        iterations,
        mean,
        median,
        std_dev: variance.sqrt(),
        samples,
    }
}
