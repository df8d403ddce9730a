//! One experiment run: build the pipeline, hand it to the execution
//! service, and wrap whatever comes back.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::crew::ExecutionService;
use crate::error::{ExecError, FailureKind};
use crate::stage::{StageSequence, build_pipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Uniform record of one run, success or failure. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    status: RunStatus,
    timestamp: DateTime<Local>,
    experiment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure_kind: Option<FailureKind>,
}

impl RunResult {
    pub fn success(experiment: impl Into<String>, results: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            timestamp: Local::now(),
            experiment: experiment.into(),
            results: Some(results.into()),
            error: None,
            failure_kind: None,
        }
    }

    /// A failed run. The error text is never empty: a blank message is
    /// replaced by the failure kind's name.
    pub fn failure(experiment: impl Into<String>, err: &ExecError) -> Self {
        let kind = err.kind();
        let mut message = err.to_string();
        if message.trim().is_empty() {
            message = kind.as_str().to_string();
        }
        Self {
            status: RunStatus::Failed,
            timestamp: Local::now(),
            experiment: experiment.into(),
            results: None,
            error: Some(message),
            failure_kind: Some(kind),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn results(&self) -> Option<&str> {
        self.results.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the pipeline for `description` and run it.
pub fn run_virtual_experiment<E>(service: &mut E, description: &str) -> RunResult
where
    E: ExecutionService + ?Sized,
{
    run_pipeline(service, &build_pipeline(description), None)
}

/// Run an already-built pipeline. Every failure is caught here and turned
/// into a failed [`RunResult`]; nothing is retried.
///
/// `soft_limit` is only checked after the fact: a run that took longer is
/// logged, not cut short.
pub fn run_pipeline<E>(service: &mut E, stages: &StageSequence, soft_limit: Option<Duration>) -> RunResult
where
    E: ExecutionService + ?Sized,
{
    info!(chars = stages.experiment().len(), "starting virtual experiment");
    let start = Instant::now();
    let outcome = service.kickoff(stages);
    let elapsed = start.elapsed();

    if let Some(limit) = soft_limit
        && elapsed > limit
    {
        warn!(
            elapsed_secs = elapsed.as_secs(),
            limit_secs = limit.as_secs(),
            "experiment ran past max_experiment_time"
        );
    }

    match outcome {
        Ok(results) => {
            info!(secs = elapsed.as_secs_f64(), "virtual experiment completed");
            RunResult::success(stages.experiment(), results)
        }
        Err(err) => {
            error!(kind = ?err.kind(), error = %err, "virtual experiment failed");
            RunResult::failure(stages.experiment(), &err)
        }
    }
}
