//! Run summary emitted at the end of a batch.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{BatchOutcome, ReportFormat, StatementFailure};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub statements: usize,
    pub profiled: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StatementFailure>,
    pub format: ReportFormat,
    #[serde(rename = "reportPath", skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

/// Wall-clock bookkeeping for one run.
#[derive(Debug, Clone)]
pub struct RunClock {
    run_id: String,
    started: OffsetDateTime,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started: OffsetDateTime::now_utc(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn finish(self, outcome: &BatchOutcome, format: ReportFormat) -> RunSummary {
        let finished = OffsetDateTime::now_utc();
        let elapsed = finished - self.started;
        RunSummary {
            run_id: self.run_id,
            started_at: rfc3339(self.started),
            finished_at: rfc3339(finished),
            duration_ms: u64::try_from(elapsed.whole_milliseconds()).unwrap_or(0),
            statements: outcome.attempted,
            profiled: outcome.profiled(),
            failed: outcome.failures.len(),
            failures: outcome.failures.clone(),
            format,
            report_path: None,
        }
    }
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.unix_timestamp().to_string())
}
