use crate::models::HistoricalVoteRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharePoint {
    pub year: i32,
    // Percentage of all votes cast that year.
    pub share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyTrend {
    pub party: String,
    // Ordered by year ascending.
    pub historical_share: Vec<SharePoint>,
    // Percentage points per year.
    pub trend_slope: f64,
    pub volatility: f64,
    pub avg_growth_rate: f64,
}

impl PartyTrend {
    pub fn last_share(&self) -> f64 {
        self.historical_share.last().map(|p| p.share).unwrap_or(0.0)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.historical_share.last().map(|p| p.year)
    }
}

// Per-party share trend over the supplied records.
// Records are expected to be filtered to a single state and position
// already; several records for the same party and year are summed.
pub fn analyze_trends(records: &[HistoricalVoteRecord]) -> BTreeMap<String, PartyTrend> {
    let mut year_totals: BTreeMap<i32, u64> = BTreeMap::new();
    let mut party_years: BTreeMap<&str, BTreeMap<i32, u64>> = BTreeMap::new();

    for record in records {
        *year_totals.entry(record.year).or_insert(0) += record.total_votes;
        *party_years
            .entry(record.party.as_str())
            .or_default()
            .entry(record.year)
            .or_insert(0) += record.total_votes;
    }

    party_years
        .into_iter()
        .map(|(party, by_year)| {
            let historical_share: Vec<SharePoint> = by_year
                .into_iter()
                .map(|(year, votes)| {
                    let total = year_totals.get(&year).copied().unwrap_or(0);
                    let share = if total > 0 {
                        votes as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    };
                    SharePoint { year, share }
                })
                .collect();

            let years: Vec<f64> = historical_share.iter().map(|p| p.year as f64).collect();
            let shares: Vec<f64> = historical_share.iter().map(|p| p.share).collect();

            let trend = PartyTrend {
                party: party.to_string(),
                trend_slope: linear_slope(&years, &shares),
                volatility: sample_std_dev(&shares),
                avg_growth_rate: average_growth_rate(&shares),
                historical_share,
            };
            (party.to_string(), trend)
        })
        .collect()
}

// Ordinary least-squares slope of `ys` against `xs`. Zero when undefined.
pub fn linear_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        numerator += dx * (ys[i] - mean_y);
        denominator += dx * dx;
    }

    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

// Sample standard deviation (n - 1 denominator). Zero below two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

// Mean period-over-period relative change, skipping periods that start at zero.
pub fn average_growth_rate(values: &[f64]) -> f64 {
    let changes: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    }
}
