#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("Degenerate electoral quotient: {valid_votes} valid votes over {available_seats} seats")]
    DegenerateQuotient { valid_votes: u64, available_seats: u32 },
    #[error("Insufficient historical data: {0}")]
    InsufficientHistoricalData(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Forecast run was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
