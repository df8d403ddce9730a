//! Lab configuration and the optional setup check.
//!
//! [`LabConfig`] is built once at start-up and passed by reference to
//! whatever needs it. Nothing in the crate reads the environment on its own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Settings for one lab process.
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    /// Key for the model provider (`GOOGLE_API_KEY`).
    pub google_api_key: Option<String>,
    /// Optional key for the web-search tool (`SERPER_API_KEY`).
    pub serper_api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub lab_name: String,
    /// Soft limit for one experiment run. Exceeding it is logged, not enforced.
    pub max_experiment_time: Duration,
    /// Per-request timeout for model and search calls.
    pub request_timeout: Duration,
    pub temperature: f32,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub protocols_dir: PathBuf,
    /// Trace each stage as it completes.
    pub verbose: bool,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            serper_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            lab_name: "Virtual BioLab AI".to_string(),
            max_experiment_time: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(120),
            temperature: 0.7,
            data_dir: PathBuf::from("./experiment_data"),
            results_dir: PathBuf::from("./results"),
            protocols_dir: PathBuf::from("./protocols"),
            verbose: true,
        }
    }
}

impl LabConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            google_api_key: get("GOOGLE_API_KEY"),
            serper_api_key: get("SERPER_API_KEY"),
            model: get("LAB_MODEL").unwrap_or(defaults.model),
            api_base: get("LAB_API_BASE").unwrap_or(defaults.api_base),
            lab_name: get("LAB_NAME").unwrap_or(defaults.lab_name),
            max_experiment_time: get("LAB_MAX_EXPERIMENT_SECS")
                .and_then(|v| parse_or_warn::<u64>("LAB_MAX_EXPERIMENT_SECS", &v))
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_experiment_time),
            request_timeout: get("LAB_REQUEST_TIMEOUT_SECS")
                .and_then(|v| parse_or_warn::<u64>("LAB_REQUEST_TIMEOUT_SECS", &v))
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            temperature: get("LAB_TEMPERATURE")
                .and_then(|v| parse_or_warn::<f32>("LAB_TEMPERATURE", &v))
                .unwrap_or(defaults.temperature),
            data_dir: get("LAB_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            results_dir: get("LAB_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            protocols_dir: get("LAB_PROTOCOLS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.protocols_dir),
            verbose: get("LAB_VERBOSE")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.verbose),
        }
    }

    fn directories(&self) -> [&Path; 3] {
        [&self.data_dir, &self.results_dir, &self.protocols_dir]
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value, "ignoring unparsable setting, using default");
            None
        }
    }
}

pub const SETUP_INSTRUCTIONS: &str = "\
Virtual Biology Lab setup

1. Set environment variables:
   export GOOGLE_API_KEY=...      # Gemini key from https://aistudio.google.com/app/apikey
   export SERPER_API_KEY=...      # optional, enables web search (https://serper.dev/)

2. Optional overrides:
   LAB_MODEL, LAB_API_BASE, LAB_NAME, LAB_TEMPERATURE,
   LAB_MAX_EXPERIMENT_SECS, LAB_REQUEST_TIMEOUT_SECS,
   LAB_DATA_DIR, LAB_RESULTS_DIR, LAB_PROTOCOLS_DIR, LAB_VERBOSE

3. Run `lab-setup` to create the data, results and protocols directories.

4. Start the lab with `virtual-biolab` and type `help`.

Custom experiment example:
   Test the effect of caffeine on yeast cell growth.
   Use concentrations: 0, 1, 5, 10, 50 mM caffeine.
   Measure OD600 every hour for 12 hours at 30°C.
";

/// One line of the setup report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupCheck {
    pub ok: bool,
    pub message: String,
}

impl SetupCheck {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetupReport {
    pub checks: Vec<SetupCheck>,
}

impl SetupReport {
    pub fn is_ready(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

/// Check credentials and create the lab directories when they are missing.
///
/// The search key is optional, so its absence is reported but not counted
/// as a failure.
pub fn validate_setup(config: &LabConfig) -> SetupReport {
    let mut checks = Vec::new();

    if config.google_api_key.is_some() {
        checks.push(SetupCheck::pass("GOOGLE_API_KEY configured"));
    } else {
        checks.push(SetupCheck::fail("GOOGLE_API_KEY not set"));
    }

    if config.serper_api_key.is_some() {
        checks.push(SetupCheck::pass("SERPER_API_KEY configured (web search enabled)"));
    } else {
        checks.push(SetupCheck::pass("SERPER_API_KEY not set (web search disabled)"));
    }

    for dir in config.directories() {
        if dir.is_dir() {
            checks.push(SetupCheck::pass(format!("directory exists: {}", dir.display())));
            continue;
        }
        match std::fs::create_dir_all(dir) {
            Ok(()) => checks.push(SetupCheck::pass(format!("created directory: {}", dir.display()))),
            Err(e) => checks.push(SetupCheck::fail(format!(
                "could not create {}: {e}",
                dir.display()
            ))),
        }
    }

    SetupReport { checks }
}
