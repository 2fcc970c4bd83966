use crate::error::EngineError;
use crate::forecast::monte_carlo::MonteCarloSimulator;
use crate::forecast::{CancellationFlag, ForecastReport, ForecastRequest, run_forecast};
use crate::models::HistoricalVoteRecord;
use crate::narrative::{NarrativeSummarizer, fallback_summary};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum RunStatus {
    Completed,
    Failed { reason: String },
    Cancelled,
}

// Terminal record of one background forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRun {
    pub id: Uuid,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub report: Option<ForecastReport>,
    // Text from the narrative port. Empty when no port is configured.
    pub narrative: String,
    // Generated summary, always present for completed runs.
    pub summary: String,
}

pub struct ForecastHandle {
    pub id: Uuid,
    cancel: CancellationFlag,
    join: JoinHandle<ForecastRun>,
}

impl ForecastHandle {
    // Ask the run to stop. The party being simulated finishes first.
    pub fn cancel(&self) {
        info!("Cancellation requested for forecast run {}", self.id);
        self.cancel.cancel();
    }

    pub async fn wait(self) -> ForecastRun {
        let id = self.id;
        match self.join.await {
            Ok(run) => run,
            Err(e) => {
                error!("Forecast run {} task failed: {}", id, e);
                let now = Utc::now();
                ForecastRun {
                    id,
                    status: RunStatus::Failed {
                        reason: format!("forecast task failed: {}", e),
                    },
                    started_at: now,
                    finished_at: now,
                    report: None,
                    narrative: String::new(),
                    summary: String::new(),
                }
            }
        }
    }
}

// Spawns forecast runs off the caller's task.
// The simulation runs on the blocking pool; the optional narrative port is
// awaited afterwards and can only ever degrade the narrative text.
#[derive(Clone, Default)]
pub struct ForecastRunner {
    summarizer: Option<Arc<dyn NarrativeSummarizer>>,
    seed: Option<u64>,
}

impl ForecastRunner {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            summarizer: None,
            seed,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn NarrativeSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    // Must be called from within a tokio runtime.
    pub fn spawn(&self, records: Vec<HistoricalVoteRecord>, request: ForecastRequest) -> ForecastHandle {
        let id = Uuid::new_v4();
        let cancel = CancellationFlag::new();
        let worker_cancel = cancel.clone();
        let summarizer = self.summarizer.clone();
        let seed = self.seed;

        let join = tokio::spawn(async move {
            let started_at = Utc::now();
            let target_year = request.target_year;
            info!("Starting forecast run {} for {}", id, target_year);

            let numeric = tokio::task::spawn_blocking(move || {
                let mut simulator = MonteCarloSimulator::from_seed_option(seed);
                run_forecast(&records, &request, &mut simulator, &worker_cancel)
            })
            .await;

            let (status, report, narrative, summary) = match numeric {
                Ok(Ok(report)) => {
                    let summary = fallback_summary(&report);
                    let narrative = match &summarizer {
                        Some(summarizer) => match summarizer.summarize(&report).await {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("Narrative for forecast run {} failed, using summary: {}", id, e);
                                summary.clone()
                            }
                        },
                        None => String::new(),
                    };
                    (RunStatus::Completed, Some(report), narrative, summary)
                }
                Ok(Err(EngineError::Cancelled)) => {
                    info!("Forecast run {} cancelled", id);
                    (RunStatus::Cancelled, None, String::new(), String::new())
                }
                Ok(Err(e)) => {
                    error!("Forecast run {} failed: {}", id, e);
                    let reason = e.to_string();
                    (RunStatus::Failed { reason }, None, String::new(), String::new())
                }
                Err(e) => {
                    error!("Forecast run {} worker panicked: {}", id, e);
                    let reason = format!("forecast worker failed: {}", e);
                    (RunStatus::Failed { reason }, None, String::new(), String::new())
                }
            };

            let finished_at = Utc::now();
            info!(
                "Forecast run {} finished as {:?} in {} ms",
                id,
                status,
                (finished_at - started_at).num_milliseconds()
            );

            ForecastRun {
                id,
                status,
                started_at,
                finished_at,
                report,
                narrative,
                summary,
            }
        });

        ForecastHandle { id, cancel, join }
    }
}
