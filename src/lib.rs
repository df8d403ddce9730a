//! A virtual biology lab driven by a five-stage LLM pipeline.
//!
//! An experiment description goes in; five lab-worker roles (protocol
//! reader, experimenter, data collector, analyst, report writer) take turns
//! on it through an [`ExecutionService`], each working from the previous
//! stage's output. The outcome comes back as a timestamped [`RunResult`].
//!
//! # Quick start
//!
//! ```rust
//! use virtual_biolab::{
//!     build_pipeline, run_virtual_experiment, ExecError, ExecutionService, Role, RunStatus,
//!     StageSequence,
//! };
//!
//! struct Canned;
//! impl ExecutionService for Canned {
//!     fn kickoff(&mut self, stages: &StageSequence) -> Result<String, ExecError> {
//!         Ok(format!("{} stages done", stages.len()))
//!     }
//! }
//!
//! let seq = build_pipeline("Test caffeine on yeast growth");
//! assert_eq!(seq.roles(), Role::ALL);
//!
//! let result = run_virtual_experiment(&mut Canned, "Test caffeine on yeast growth");
//! assert_eq!(result.status(), RunStatus::Success);
//! assert_eq!(result.results(), Some("5 stages done"));
//! ```
//!
//! The real service is [`Crew`], which talks to the Gemini API:
//!
//! ```rust,no_run
//! use virtual_biolab::{Crew, LabConfig, run_virtual_experiment};
//!
//! let config = LabConfig::from_env();
//! let mut crew = Crew::from_config(&config).with_tracing();
//! let result = run_virtual_experiment(&mut crew, "Test antibiotic resistance in E. coli");
//! println!("{}", result.to_json_pretty().unwrap());
//! ```

pub mod catalog;
pub mod config;
mod crew;
mod ctx;
mod error;
pub mod lab;
pub mod llm;
pub mod persist;
pub mod reference;
pub mod repl;
mod run;
mod stage;
pub mod tools;

pub use catalog::{Catalog, CatalogEntry, UnknownExperiment};
pub use config::{LabConfig, SetupReport, validate_setup};
pub use crew::{Crew, ErrorEvent, ExecutionService, StageEvent};
pub use ctx::Ctx;
pub use error::{ExecError, FailureKind};
pub use lab::{ExperimentRun, ExperimentSummary, VirtualLab};
pub use llm::LlmClient;
pub use run::{RunResult, RunStatus, run_pipeline, run_virtual_experiment};
pub use stage::{Capability, Role, Stage, StageSequence, build_pipeline};
