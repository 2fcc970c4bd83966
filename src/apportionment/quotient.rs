use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

// Statutory thresholds derived from the electoral quotient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub electoral_quotient: u64,
    // 80% of the quotient, floored.
    pub barrier_threshold: u64,
    // 20% of the quotient, floored.
    pub candidate_min_votes: u64,
}

impl Thresholds {
    pub fn compute(valid_votes: u64, available_seats: u32) -> Result<Self> {
        if available_seats == 0 {
            return Err(EngineError::InvalidScenario(
                "available seats must be greater than zero".to_string(),
            ));
        }
        if valid_votes < u64::from(available_seats) {
            return Err(EngineError::InvalidScenario(format!(
                "valid votes ({}) are fewer than available seats ({})",
                valid_votes, available_seats
            )));
        }

        let electoral_quotient = valid_votes / u64::from(available_seats);
        if electoral_quotient == 0 {
            return Err(EngineError::DegenerateQuotient {
                valid_votes,
                available_seats,
            });
        }

        // Integer arithmetic keeps floor(0.8 * EQ) exact for large quotients.
        Ok(Self {
            electoral_quotient,
            barrier_threshold: electoral_quotient * 8 / 10,
            candidate_min_votes: electoral_quotient * 2 / 10,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_for_round_numbers() {
        let thresholds = Thresholds::compute(1000, 10).unwrap();
        assert_eq!(thresholds.electoral_quotient, 100);
        assert_eq!(thresholds.barrier_threshold, 80);
        assert_eq!(thresholds.candidate_min_votes, 20);
    }

    #[test]
    fn test_thresholds_are_floored() {
        let thresholds = Thresholds::compute(1099, 10).unwrap();
        assert_eq!(thresholds.electoral_quotient, 109);
        assert_eq!(thresholds.barrier_threshold, 87);
        assert_eq!(thresholds.candidate_min_votes, 21);
    }

    #[test]
    fn test_zero_seats_is_rejected() {
        let err = Thresholds::compute(1000, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidScenario(_)));
    }

    #[test]
    fn test_fewer_votes_than_seats_is_rejected() {
        let err = Thresholds::compute(9, 10).unwrap_err();
        assert!(matches!(err, EngineError::InvalidScenario(_)));
    }

    #[test]
    fn test_minimum_valid_scenario() {
        let thresholds = Thresholds::compute(10, 10).unwrap();
        assert_eq!(thresholds.electoral_quotient, 1);
        assert_eq!(thresholds.barrier_threshold, 0);
        assert_eq!(thresholds.candidate_min_votes, 0);
    }
}
