use crate::forecast::ForecastReport;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("Narrative service unavailable: {0}")]
    Unavailable(String),
    #[error("Narrative service returned an invalid response: {0}")]
    InvalidResponse(String),
}

// Port to an external text generator that describes a finished forecast.
// Implementations may fail freely; a failure never affects the numbers.
#[async_trait]
pub trait NarrativeSummarizer: Send + Sync {
    async fn summarize(&self, report: &ForecastReport) -> Result<String, NarrativeError>;
}

pub fn fallback_summary(report: &ForecastReport) -> String {
    let mut summary = format!("Forecast for {}", report.target_year);
    if report.scenario_applied {
        summary.push_str(" (scenario-adjusted)");
    }
    summary.push_str(":\n");

    let mut ranked: Vec<_> = report.results.iter().collect();
    ranked.sort_by(|a, b| b.predicted_vote_share.total_cmp(&a.predicted_vote_share));

    for result in ranked {
        summary.push_str(&format!(
            "{}: {:.1}% ({:.1}% to {:.1}%), {:?}, confidence {:.0}%\n",
            result.party,
            result.predicted_vote_share,
            result.lower_bound,
            result.upper_bound,
            result.trend_direction,
            result.confidence * 100.0
        ));
    }

    let swing: Vec<&str> = report
        .swing_regions
        .iter()
        .filter(|r| r.is_swing)
        .map(|r| r.region.as_str())
        .collect();
    if swing.is_empty() {
        summary.push_str("No swing regions detected.");
    } else {
        summary.push_str(&format!("Swing regions: {}.", swing.join(", ")));
    }

    summary
}
