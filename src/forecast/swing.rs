use super::trend::PartyTrend;
use crate::models::HistoricalVoteRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const SWING_MARGIN: f64 = 10.0;
const SWING_VOLATILITY: f64 = 2.0;
const TIGHT_MARGIN: f64 = 5.0;
const HIGH_VOLATILITY: f64 = 5.0;
const RISING_SLOPE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyFactor {
    TightMargin,
    HighVolatility,
    RisingChallenger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingRegion {
    pub region: String,
    pub year: i32,
    pub margin_percent: f64,
    // Mean volatility of the two leading parties.
    pub volatility_score: f64,
    pub leading_entity: String,
    pub challenging_entity: String,
    pub is_swing: bool,
    pub swing_magnitude: f64,
    pub recent_trend_shift: f64,
    pub outcome_uncertainty: f64,
    pub key_factors: Vec<KeyFactor>,
}

// Find competitive regions from historical results grouped by `state`.
// Every region with at least two contenders in its latest year is
// returned, sorted by volatility score descending; `is_swing` marks the
// ones with a margin under 10 points and volatility above 2.
pub fn detect_swing_regions(
    records: &[HistoricalVoteRecord],
    trends: &BTreeMap<String, PartyTrend>,
    volatility_multiplier: f64,
) -> Vec<SwingRegion> {
    let mut by_region: BTreeMap<&str, Vec<&HistoricalVoteRecord>> = BTreeMap::new();
    for record in records {
        by_region.entry(record.state.as_str()).or_default().push(record);
    }

    let mut regions: Vec<SwingRegion> = by_region
        .into_iter()
        .filter_map(|(region, records)| analyze_region(region, &records, trends, volatility_multiplier))
        .collect();

    regions.sort_by(|a, b| {
        b.volatility_score
            .total_cmp(&a.volatility_score)
            .then_with(|| a.region.cmp(&b.region))
    });
    regions
}

fn analyze_region(
    region: &str,
    records: &[&HistoricalVoteRecord],
    trends: &BTreeMap<String, PartyTrend>,
    volatility_multiplier: f64,
) -> Option<SwingRegion> {
    // Only the latest election in the region counts
    let year = records.iter().map(|r| r.year).max()?;

    let mut votes: HashMap<&str, u64> = HashMap::new();
    for record in records.iter().filter(|r| r.year == year) {
        *votes.entry(record.party.as_str()).or_insert(0) += record.total_votes;
    }
    let mut ranked: Vec<(&str, u64)> = votes.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    if ranked.len() < 2 {
        return None;
    }
    let region_total: u64 = ranked.iter().map(|(_, v)| v).sum();
    if region_total == 0 {
        return None;
    }

    // Leader vs challenger
    let (leader, leader_votes) = ranked[0];
    let (challenger, challenger_votes) = ranked[1];
    let margin_percent = (leader_votes - challenger_votes) as f64 / region_total as f64 * 100.0;

    let (leader_volatility, leader_slope) = volatility_and_slope(trends, leader);
    let (challenger_volatility, challenger_slope) = volatility_and_slope(trends, challenger);
    let avg_volatility = (leader_volatility + challenger_volatility) / 2.0;

    let is_swing = margin_percent < SWING_MARGIN && avg_volatility > SWING_VOLATILITY;
    let recent_trend_shift = challenger_slope - leader_slope;
    let outcome_uncertainty =
        ((SWING_MARGIN - margin_percent) / SWING_MARGIN * avg_volatility / 5.0).clamp(0.0, 1.0);

    // Qualitative tags
    let mut key_factors = Vec::new();
    if margin_percent < TIGHT_MARGIN {
        key_factors.push(KeyFactor::TightMargin);
    }
    if avg_volatility > HIGH_VOLATILITY {
        key_factors.push(KeyFactor::HighVolatility);
    }
    if challenger_slope > RISING_SLOPE && recent_trend_shift > 0.0 {
        key_factors.push(KeyFactor::RisingChallenger);
    }

    Some(SwingRegion {
        region: region.to_string(),
        year,
        margin_percent,
        volatility_score: avg_volatility,
        leading_entity: leader.to_string(),
        challenging_entity: challenger.to_string(),
        is_swing,
        swing_magnitude: avg_volatility * volatility_multiplier,
        recent_trend_shift,
        outcome_uncertainty,
        key_factors,
    })
}

fn volatility_and_slope(trends: &BTreeMap<String, PartyTrend>, party: &str) -> (f64, f64) {
    trends
        .get(party)
        .map(|t| (t.volatility, t.trend_slope))
        .unwrap_or((0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::trend::SharePoint;

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

    fn trend(party: &str, volatility: f64, slope: f64) -> (String, PartyTrend) {
        (
            party.to_string(),
            PartyTrend {
                party: party.to_string(),
                historical_share: vec![SharePoint { year: 2022, share: 40.0 }],
                trend_slope: slope,
                volatility,
                avg_growth_rate: 0.0,
            },
        )
    }

    #[test]
    fn test_close_volatile_region_is_swing() {
        let records = vec![
            record(2018, "A", "MG", 600),
            record(2018, "B", "MG", 400),
            record(2022, "A", "MG", 520),
            record(2022, "B", "MG", 480),
        ];
        let trends = BTreeMap::from([trend("A", 3.0, -1.0), trend("B", 4.0, 1.0)]);

        let regions = detect_swing_regions(&records, &trends, 1.5);

        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.year, 2022);
        assert_eq!(region.leading_entity, "A");
        assert!((region.margin_percent - 4.0).abs() < 1e-9);
        assert!(region.is_swing);
        assert!((region.swing_magnitude - 5.25).abs() < 1e-9);
        assert!((region.recent_trend_shift - 2.0).abs() < 1e-9);
        assert!(region.key_factors.contains(&KeyFactor::TightMargin));
        assert!(region.key_factors.contains(&KeyFactor::RisingChallenger));
        assert!(!region.key_factors.contains(&KeyFactor::HighVolatility));
    }

    #[test]
    fn test_wide_margin_is_never_swing() {
        let records = vec![record(2022, "A", "RJ", 575), record(2022, "B", "RJ", 425)];
        let trends = BTreeMap::from([trend("A", 50.0, 0.0), trend("B", 50.0, 0.0)]);

        let regions = detect_swing_regions(&records, &trends, 1.0);

        assert!((regions[0].margin_percent - 15.0).abs() < 1e-9);
        assert!(!regions[0].is_swing);
        assert_eq!(regions[0].outcome_uncertainty, 0.0);
    }

    #[test]
    fn test_single_contender_regions_are_skipped() {
        let records = vec![record(2022, "A", "AC", 100), record(2018, "B", "AC", 90)];
        let regions = detect_swing_regions(&records, &BTreeMap::new(), 1.0);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_regions_sorted_by_volatility() {
        let records = vec![
            record(2022, "A", "BA", 510),
            record(2022, "B", "BA", 490),
            record(2022, "C", "PE", 510),
            record(2022, "D", "PE", 490),
        ];
        let trends = BTreeMap::from([
            trend("A", 1.0, 0.0),
            trend("B", 1.0, 0.0),
            trend("C", 6.0, 0.0),
            trend("D", 8.0, 0.0),
        ]);

        let regions = detect_swing_regions(&records, &trends, 1.0);

        assert_eq!(regions[0].region, "PE");
        assert!(regions[0].key_factors.contains(&KeyFactor::HighVolatility));
        assert_eq!(regions[1].region, "BA");
        assert!(!regions[1].is_swing);
        assert!(regions[0].outcome_uncertainty <= 1.0);
    }
}
