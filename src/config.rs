use std::env;
use std::str::FromStr;

pub const DEFAULT_ITERATIONS: u32 = 10_000;
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_POLL_WEIGHT: f64 = 0.30;
pub const DEFAULT_VOLATILITY_MULTIPLIER: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
    #[error("Out of range: {0}")]
    OutOfRange(String),
}

// Tunables for forecast runs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub iterations: u32,
    pub confidence_level: f64,
    pub poll_weight: f64,
    pub volatility_multiplier: f64,
    // Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE,
            poll_weight: DEFAULT_POLL_WEIGHT,
            volatility_multiplier: DEFAULT_VOLATILITY_MULTIPLIER,
            seed: None,
        }
    }
}

impl EngineConfig {
    // Read settings from the process environment, falling back to defaults.
    // Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            iterations: read_var("SEATCAST_ITERATIONS")?.unwrap_or(defaults.iterations),
            confidence_level: read_var("SEATCAST_CONFIDENCE")?.unwrap_or(defaults.confidence_level),
            poll_weight: read_var("SEATCAST_POLL_WEIGHT")?.unwrap_or(defaults.poll_weight),
            volatility_multiplier: read_var("SEATCAST_VOLATILITY_MULTIPLIER")?
                .unwrap_or(defaults.volatility_multiplier),
            seed: read_var("SEATCAST_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::OutOfRange("iterations must be at least 1".to_string()));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::OutOfRange(format!(
                "confidence level {} is not inside (0, 1)",
                self.confidence_level
            )));
        }
        if !(0.0..=1.0).contains(&self.poll_weight) {
            return Err(ConfigError::OutOfRange(format!(
                "poll weight {} is not inside [0, 1]",
                self.poll_weight
            )));
        }
        if !(self.volatility_multiplier > 0.0) {
            return Err(ConfigError::OutOfRange(format!(
                "volatility multiplier {} must be positive",
                self.volatility_multiplier
            )));
        }
        Ok(())
    }
}

fn read_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
