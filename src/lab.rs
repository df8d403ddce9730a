use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::catalog::{Catalog, UnknownExperiment};
use crate::config::LabConfig;
use crate::crew::ExecutionService;
use crate::persist;
use crate::run::{RunResult, run_pipeline};
use crate::stage::build_pipeline;
use crate::tools;

/// Listing row for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentSummary {
    pub index: usize,
    pub name: &'static str,
    pub title: String,
    pub headline: String,
}

/// Outcome of running one named experiment.
#[derive(Debug, Clone)]
pub struct ExperimentRun {
    pub name: &'static str,
    pub result: RunResult,
    /// Where the result was written, if it was.
    pub saved_to: Option<PathBuf>,
}

/// The catalog, an execution service, and where results go.
pub struct VirtualLab<E: ExecutionService> {
    catalog: Catalog,
    service: E,
    results_dir: PathBuf,
    protocols_dir: PathBuf,
    max_experiment_time: Duration,
}

impl<E: ExecutionService> VirtualLab<E> {
    pub fn new(config: &LabConfig, service: E) -> Self {
        Self {
            catalog: Catalog::new(),
            service,
            results_dir: config.results_dir.clone(),
            protocols_dir: config.protocols_dir.clone(),
            max_experiment_time: config.max_experiment_time,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn service(&self) -> &E {
        &self.service
    }

    pub fn list_experiments(&self) -> Vec<ExperimentSummary> {
        self.catalog
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| ExperimentSummary {
                index: i + 1,
                name: e.name,
                title: e.title(),
                headline: e.headline(),
            })
            .collect()
    }

    /// Run one catalog experiment.
    ///
    /// With `save`, a successful result is written to the results directory.
    /// Failed runs are never written. A write error is logged and leaves
    /// `saved_to` empty; the run itself still counts.
    pub fn run_experiment(
        &mut self,
        name: &str,
        save: bool,
    ) -> Result<ExperimentRun, UnknownExperiment> {
        let entry = match self.catalog.get(name) {
            Ok(entry) => *entry,
            Err(e) => {
                warn!(name, available = ?e.available, "experiment not found");
                return Err(e);
            }
        };

        info!(experiment = entry.name, "running catalog experiment");
        let mut stages = build_pipeline(&entry.describe());
        if let Some(path) = tools::find_protocol(&self.protocols_dir, entry.name) {
            info!(path = %path.display(), "attaching protocol file");
            stages = stages.with_protocol_file(path);
        }

        let result = run_pipeline(&mut self.service, &stages, Some(self.max_experiment_time));

        let saved_to = if save && result.is_success() {
            match persist::save_result(&self.results_dir, entry.name, &result) {
                Ok(path) => Some(path),
                Err(e) => {
                    error!(experiment = entry.name, error = %e, "could not save result");
                    None
                }
            }
        } else {
            None
        };

        Ok(ExperimentRun {
            name: entry.name,
            result,
            saved_to,
        })
    }

    /// Run every catalog experiment in order, saving successes. One failure
    /// does not stop the batch.
    pub fn run_all_experiments(&mut self) -> Vec<ExperimentRun> {
        let names = self.catalog.names();
        let mut runs = Vec::with_capacity(names.len());

        for name in names {
            match self.run_experiment(name, true) {
                Ok(run) => {
                    if run.result.is_success() {
                        info!(experiment = name, "completed successfully");
                    } else {
                        warn!(
                            experiment = name,
                            error = run.result.error().unwrap_or("unknown error"),
                            "experiment failed, continuing batch"
                        );
                    }
                    runs.push(run);
                }
                // names come from the catalog itself
                Err(e) => warn!(error = %e, "skipping catalog entry"),
            }
        }

        runs
    }

    /// Run a free-text experiment. Custom runs are not saved.
    pub fn run_custom(&mut self, description: &str) -> RunResult {
        run_pipeline(
            &mut self.service,
            &build_pipeline(description),
            Some(self.max_experiment_time),
        )
    }
}
