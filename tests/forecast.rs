use chrono::NaiveDate;
use seatcast::forecast::monte_carlo::MonteCarloSimulator;
use seatcast::forecast::swing::KeyFactor;
use seatcast::forecast::TrendDirection;
use seatcast::models::{
    ExternalFactor, FactorImpact, HistoricalVoteRecord, PartyAdjustment, PollingPoint, ScenarioAdjustment,
};
use seatcast::{CancellationFlag, EngineConfig, EngineError, ForecastRequest, run_forecast};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

fn record(year: i32, party: &str, state: &str, votes: u64) -> HistoricalVoteRecord {
    HistoricalVoteRecord {
        year,
        party: party.to_string(),
        state: state.to_string(),
        position: "governor".to_string(),
        total_votes: votes,
        candidate_count: 1,
    }
}

// A climbs 30 -> 40 -> 50 in SP while B falls; RJ is a landslide for A.
fn history() -> Vec<HistoricalVoteRecord> {
    vec![
        record(2014, "A", "SP", 300),
        record(2014, "B", "SP", 700),
        record(2018, "A", "SP", 400),
        record(2018, "B", "SP", 600),
        record(2022, "A", "SP", 500),
        record(2022, "B", "SP", 500),
        record(2022, "A", "RJ", 800),
        record(2022, "B", "RJ", 200),
    ]
}

fn request(target_year: i32) -> ForecastRequest {
    let config = EngineConfig {
        iterations: 5_000,
        ..EngineConfig::default()
    };
    let mut request = ForecastRequest::new(target_year, &config);
    request.state = Some("SP".to_string());
    request.position = Some("governor".to_string());
    request
}

#[test]
fn test_stable_history_projects_exact_shares() {
    let records = vec![
        record(2014, "A", "SP", 600),
        record(2014, "B", "SP", 400),
        record(2018, "A", "SP", 600),
        record(2018, "B", "SP", 400),
        record(2022, "A", "SP", 600),
        record(2022, "B", "SP", 400),
    ];
    let mut simulator = MonteCarloSimulator::seeded(7);

    let report = run_forecast(&records, &request(2026), &mut simulator, &CancellationFlag::new()).unwrap();

    let a = report.result_for("A").unwrap();
    assert!((a.predicted_vote_share - 60.0).abs() < 1e-9);
    assert!((a.lower_bound - 60.0).abs() < 1e-9);
    assert!((a.upper_bound - 60.0).abs() < 1e-9);
    assert_eq!(a.trend_direction, TrendDirection::Stable);
    assert!((a.confidence - 1.0).abs() < 1e-9);

    let b = report.result_for("B").unwrap();
    assert!((b.predicted_vote_share - 40.0).abs() < 1e-9);
    assert!(!report.scenario_applied);
    assert!(!report.normalized);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_baseline_forecast_follows_trend() {
    let mut simulator = MonteCarloSimulator::seeded(42);

    let report = run_forecast(&history(), &request(2026), &mut simulator, &CancellationFlag::new()).unwrap();

    assert_eq!(report.target_year, 2026);
    assert_eq!(report.records_used, 6);
    assert_eq!(report.results.len(), 2);

    let a = report.result_for("A").unwrap();
    let b = report.result_for("B").unwrap();
    assert_eq!(a.trend_direction, TrendDirection::Rising);
    assert_eq!(b.trend_direction, TrendDirection::Falling);
    assert!(a.predicted_vote_share > b.predicted_vote_share);
    for result in &report.results {
        assert!(result.lower_bound <= result.predicted_vote_share + 1e-9);
        assert!(result.predicted_vote_share <= result.upper_bound + 1e-9);
        assert!((0.3..=1.0).contains(&result.confidence));
        assert!(!result.influence_factors.is_empty());
    }
}

#[test]
fn test_same_seed_gives_same_forecast() {
    let first = run_forecast(
        &history(),
        &request(2026),
        &mut MonteCarloSimulator::seeded(99),
        &CancellationFlag::new(),
    )
    .unwrap();
    let second = run_forecast(
        &history(),
        &request(2026),
        &mut MonteCarloSimulator::seeded(99),
        &CancellationFlag::new(),
    )
    .unwrap();

    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.party, b.party);
        assert_eq!(a.predicted_vote_share, b.predicted_vote_share);
        assert_eq!(a.lower_bound, b.lower_bound);
        assert_eq!(a.upper_bound, b.upper_bound);
    }
}

#[test]
fn test_scenario_forecast_is_normalized() {
    let mut party_adjustments = HashMap::new();
    party_adjustments.insert(
        "B".to_string(),
        PartyAdjustment {
            vote_share_adjust: 5.0,
        },
    );
    let scenario = ScenarioAdjustment {
        polling_data: vec![
            PollingPoint {
                party: "A".to_string(),
                percent: 20.0,
                source: Some("old".to_string()),
                date: NaiveDate::from_ymd_opt(2025, 1, 10),
            },
            PollingPoint {
                party: "A".to_string(),
                percent: 55.0,
                source: Some("recent".to_string()),
                date: NaiveDate::from_ymd_opt(2026, 3, 1),
            },
        ],
        party_adjustments,
        external_factors: vec![ExternalFactor {
            description: "Economic downturn".to_string(),
            impact: FactorImpact::Negative,
            magnitude: 50.0,
        }],
    };
    let mut request = request(2026);
    request.scenario = Some(scenario);

    let report = run_forecast(&history(), &request, &mut MonteCarloSimulator::seeded(3), &CancellationFlag::new())
        .unwrap();

    assert!(report.scenario_applied);
    assert!(report.normalized);
    assert!((report.total_predicted_share() - 100.0).abs() < 0.01);
    assert!((report.volatility_multiplier - 0.95).abs() < 1e-9);

    let a = report.result_for("A").unwrap();
    assert!(a.influence_factors.iter().any(|f| f.contains("recent")));
    assert!(!a.influence_factors.iter().any(|f| f.contains("(old)")));
    assert!(a.influence_factors.iter().any(|f| f.contains("Economic downturn")));
    let b = report.result_for("B").unwrap();
    assert!(b.influence_factors.iter().any(|f| f.contains("Manual adjustment")));
}

#[test]
fn test_empty_scenario_is_treated_as_baseline() {
    let mut request = request(2026);
    request.scenario = Some(ScenarioAdjustment::default());

    let report = run_forecast(&history(), &request, &mut MonteCarloSimulator::seeded(3), &CancellationFlag::new())
        .unwrap();

    assert!(!report.scenario_applied);
    assert!(!report.normalized);
}

#[test]
fn test_no_matching_records_is_insufficient_data() {
    let mut request = request(2026);
    request.state = Some("MG".to_string());

    let outcome = run_forecast(&history(), &request, &mut MonteCarloSimulator::seeded(1), &CancellationFlag::new());

    assert!(matches!(outcome, Err(EngineError::InsufficientHistoricalData(_))));
}

#[test]
fn test_target_year_not_after_history_warns() {
    let report = run_forecast(
        &history(),
        &request(2022),
        &mut MonteCarloSimulator::seeded(5),
        &CancellationFlag::new(),
    )
    .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn test_invalid_iterations_are_rejected() {
    let mut request = request(2026);
    request.iterations = 0;

    let outcome = run_forecast(&history(), &request, &mut MonteCarloSimulator::seeded(1), &CancellationFlag::new());

    assert!(matches!(outcome, Err(EngineError::InvalidParameter(_))));
}

#[test]
fn test_cancelled_forecast_stops() {
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let outcome = run_forecast(&history(), &request(2026), &mut MonteCarloSimulator::seeded(1), &cancel);

    assert!(matches!(outcome, Err(EngineError::Cancelled)));
}

// Raises the cancellation flag on its first draw and counts every draw.
struct CancelOnFirstDraw {
    inner: ChaCha8Rng,
    cancel: CancellationFlag,
    draws: Rc<Cell<usize>>,
}

impl CancelOnFirstDraw {
    fn record_draw(&self) {
        self.cancel.cancel();
        self.draws.set(self.draws.get() + 1);
    }
}

impl RngCore for CancelOnFirstDraw {
    fn next_u32(&mut self) -> u32 {
        self.record_draw();
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.record_draw();
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.record_draw();
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.record_draw();
        self.inner.try_fill_bytes(dest)
    }
}

#[test]
fn test_cancel_during_first_party_stops_before_second() {
    let cancel = CancellationFlag::new();
    let draws = Rc::new(Cell::new(0));
    let rng = CancelOnFirstDraw {
        inner: ChaCha8Rng::seed_from_u64(4),
        cancel: cancel.clone(),
        draws: Rc::clone(&draws),
    };
    let request = request(2026);

    let outcome = run_forecast(&history(), &request, &mut MonteCarloSimulator::new(rng), &cancel);

    assert!(matches!(outcome, Err(EngineError::Cancelled)));
    // The first party's simulation ran to completion (two uniforms per sample), the second never started.
    assert_eq!(draws.get(), 2 * request.iterations as usize);
}

#[test]
fn test_forecast_reports_swing_regions_across_states() {
    let report = run_forecast(
        &history(),
        &request(2026),
        &mut MonteCarloSimulator::seeded(11),
        &CancellationFlag::new(),
    )
    .unwrap();

    assert_eq!(report.swing_regions.len(), 2);

    let sp = report.swing_regions.iter().find(|r| r.region == "SP").unwrap();
    assert!(sp.is_swing);
    assert_eq!(sp.year, 2022);
    assert!(sp.margin_percent.abs() < 1e-9);
    assert!(sp.key_factors.contains(&KeyFactor::TightMargin));
    assert!(sp.key_factors.contains(&KeyFactor::HighVolatility));

    let rj = report.swing_regions.iter().find(|r| r.region == "RJ").unwrap();
    assert!(!rj.is_swing);
    assert_eq!(rj.leading_entity, "A");
    assert!((rj.margin_percent - 60.0).abs() < 1e-9);
}
