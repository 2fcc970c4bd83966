use super::trend::PartyTrend;
use crate::error::{EngineError, Result};
use crate::models::{PollingPoint, ScenarioAdjustment};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

pub const MIN_VOLATILITY_MULTIPLIER: f64 = 0.1;
const EXTERNAL_FACTOR_SCALE: f64 = 0.1;

// Trends after polls, manual deltas and external factors were folded in.
#[derive(Debug, Clone)]
pub struct AdjustedScenario {
    pub trends: BTreeMap<String, PartyTrend>,
    pub volatility_multiplier: f64,
    // Human-readable notes per party, fed into forecast influence factors.
    pub influences: BTreeMap<String, Vec<String>>,
    // Notes that apply to every party.
    pub global_influences: Vec<String>,
}

impl AdjustedScenario {
    pub fn unadjusted(trends: BTreeMap<String, PartyTrend>, volatility_multiplier: f64) -> Self {
        Self {
            trends,
            volatility_multiplier,
            influences: BTreeMap::new(),
            global_influences: Vec::new(),
        }
    }
}

// Blend a scenario into the trend map.
// Steps run in order: poll blending of the latest share with weight
// `poll_weight`, manual share deltas, then the external-factor volatility
// multiplier `base + sum(sign * magnitude) / 100 * 0.1`, floored at 0.1.
pub fn apply_scenario(
    mut trends: BTreeMap<String, PartyTrend>,
    scenario: &ScenarioAdjustment,
    poll_weight: f64,
    base_multiplier: f64,
) -> Result<AdjustedScenario> {
    if !(0.0..=1.0).contains(&poll_weight) {
        return Err(EngineError::InvalidParameter(format!(
            "poll weight {} is not inside [0, 1]",
            poll_weight
        )));
    }

    let mut influences: BTreeMap<String, Vec<String>> = BTreeMap::new();

    // Polls
    for (party, poll) in latest_polls(&scenario.polling_data) {
        let Some(trend) = trends.get_mut(party) else {
            warn!("Poll for '{}' ignored: no historical trend for this party", party);
            continue;
        };
        let Some(last) = trend.historical_share.last_mut() else {
            continue;
        };
        let before = last.share;
        last.share = before * (1.0 - poll_weight) + poll.percent * poll_weight;
        debug!("Poll blend for {}: {:.2} -> {:.2}", party, before, last.share);
        influences.entry(party.to_string()).or_default().push(format!(
            "Poll at {:.1}% blended at {:.0}% weight{}",
            poll.percent,
            poll_weight * 100.0,
            poll.source.as_ref().map(|s| format!(" ({})", s)).unwrap_or_default()
        ));
    }

    // Sorted for stable notes and logs.
    let mut manual: Vec<_> = scenario.party_adjustments.iter().collect();
    manual.sort_by(|a, b| a.0.cmp(b.0));
    for (party, adjustment) in manual {
        if adjustment.vote_share_adjust == 0.0 {
            continue;
        }
        let Some(last) = trends.get_mut(party).and_then(|t| t.historical_share.last_mut()) else {
            warn!("Manual adjustment for '{}' ignored: no historical trend for this party", party);
            continue;
        };
        let before = last.share;
        last.share = (before + adjustment.vote_share_adjust).clamp(0.0, 100.0);
        debug!("Manual adjustment for {}: {:.2} -> {:.2}", party, before, last.share);
        influences
            .entry(party.clone())
            .or_default()
            .push(format!("Manual adjustment of {:+.1} points", adjustment.vote_share_adjust));
    }

    // External factors only move the volatility multiplier
    let factor_sum: f64 = scenario
        .external_factors
        .iter()
        .map(|factor| factor.impact.sign() * factor.magnitude)
        .sum();
    let delta = factor_sum / 100.0 * EXTERNAL_FACTOR_SCALE;
    let volatility_multiplier = (base_multiplier + delta).max(MIN_VOLATILITY_MULTIPLIER);

    let global_influences: Vec<String> = scenario
        .external_factors
        .iter()
        .map(|factor| format!("External factor: {} ({:?}, magnitude {:.0})", factor.description, factor.impact, factor.magnitude))
        .collect();
    if !scenario.external_factors.is_empty() {
        debug!(
            "External factors moved the volatility multiplier from {:.3} to {:.3}",
            base_multiplier, volatility_multiplier
        );
    }

    Ok(AdjustedScenario {
        trends,
        volatility_multiplier,
        influences,
        global_influences,
    })
}

// The most recent poll per party. Undated polls rank below dated ones;
// among equals the later entry in the list wins.
fn latest_polls(polls: &[PollingPoint]) -> BTreeMap<&str, &PollingPoint> {
    let mut latest: HashMap<&str, &PollingPoint> = HashMap::new();
    for poll in polls {
        match latest.get(poll.party.as_str()) {
            Some(current) if current.date > poll.date => {}
            _ => {
                latest.insert(poll.party.as_str(), poll);
            }
        }
    }
    latest.into_iter().collect()
}
