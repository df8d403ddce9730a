//! The five lab roles and the fixed stage sequence built from an experiment
//! description.

use std::path::{Path, PathBuf};

use crate::reference;

/// A tool a role may use while working on its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    FileRead,
    WebSearch,
}

/// One lab-worker persona. Order of declaration is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    ProtocolRead,
    Simulate,
    Collect,
    Analyze,
    Report,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::ProtocolRead,
        Role::Simulate,
        Role::Collect,
        Role::Analyze,
        Role::Report,
    ];

    /// Short key used for logs and context storage.
    pub fn slug(self) -> &'static str {
        match self {
            Role::ProtocolRead => "protocol_reader",
            Role::Simulate => "virtual_experimenter",
            Role::Collect => "data_collector",
            Role::Analyze => "data_analyst",
            Role::Report => "report_writer",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Role::ProtocolRead => "Protocol Reader",
            Role::Simulate => "Virtual Experimenter",
            Role::Collect => "Data Collector",
            Role::Analyze => "Data Analyst",
            Role::Report => "Report Writer",
        }
    }

    pub fn goal(self) -> &'static str {
        match self {
            Role::ProtocolRead => {
                "Read and understand experimental protocols, extract key parameters and steps"
            }
            Role::Simulate => {
                "Simulate biological experiments using historical data and established patterns"
            }
            Role::Collect => {
                "Collect, organize, and structure experimental data in a systematic way"
            }
            Role::Analyze => {
                "Analyze experimental data, perform statistical tests, and create meaningful visualizations"
            }
            Role::Report => {
                "Write comprehensive experiment reports and suggest future research directions"
            }
        }
    }

    pub fn backstory(self) -> &'static str {
        match self {
            Role::ProtocolRead => {
                "You are an experienced lab technician who specializes in reading and \
                 interpreting biological experiment protocols. You can break down complex \
                 procedures into clear, actionable steps and identify all necessary materials \
                 and conditions."
            }
            Role::Simulate => {
                "You are a skilled researcher who can predict experimental outcomes based on \
                 existing scientific literature and data. You understand how different variables \
                 affect biological systems and can generate realistic experimental results."
            }
            Role::Collect => {
                "You are a meticulous data manager who ensures all experimental observations are \
                 properly recorded, organized, and formatted for analysis. You maintain data \
                 integrity and follow scientific data management standards."
            }
            Role::Analyze => {
                "You are a bioinformatician with expertise in statistical analysis and data \
                 visualization. You can identify patterns, calculate significance, and present \
                 findings through clear graphs and charts."
            }
            Role::Report => {
                "You are a scientific writer who can synthesize experimental results into clear, \
                 professional reports. You understand scientific methodology and can suggest \
                 logical next steps based on current findings."
            }
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::ProtocolRead => &[Capability::FileRead],
            Role::Simulate => &[Capability::WebSearch],
            Role::Collect | Role::Analyze | Role::Report => &[],
        }
    }

    /// System prompt sent with every model call for this role.
    pub fn system_prompt(self) -> String {
        format!(
            "You are the {} of a virtual biology lab.\nYour goal: {}\n\n{}",
            self.title(),
            self.goal(),
            self.backstory()
        )
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// One unit of work: a role and what it is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub role: Role,
    pub instruction: String,
    pub expected_output: &'static str,
}

impl Stage {
    /// Render the user prompt for this stage.
    ///
    /// `previous` is the output of the stage before it, `tool_notes` whatever
    /// the role's capabilities produced.
    pub fn prompt(&self, previous: Option<&str>, tool_notes: &[String]) -> String {
        let mut prompt = self.instruction.trim().to_string();

        if let Some(previous) = previous.filter(|p| !p.trim().is_empty()) {
            prompt.push_str("\n\nOutput from the previous stage:\n");
            prompt.push_str(previous.trim());
        }

        if !tool_notes.is_empty() {
            prompt.push_str("\n\nTool results:\n");
            prompt.push_str(&tool_notes.join("\n\n"));
        }

        prompt.push_str("\n\nExpected output: ");
        prompt.push_str(self.expected_output);
        prompt
    }
}

/// Exactly five stages in fixed role order, plus the description they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSequence {
    experiment: String,
    stages: [Stage; 5],
    protocol_file: Option<PathBuf>,
}

impl StageSequence {
    /// Attach a protocol document for roles with [`Capability::FileRead`].
    pub fn with_protocol_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.protocol_file = Some(path.into());
        self
    }

    pub fn protocol_file(&self) -> Option<&Path> {
        self.protocol_file.as_deref()
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn roles(&self) -> [Role; 5] {
        self.stages.each_ref().map(|s| s.role)
    }
}

impl<'a> IntoIterator for &'a StageSequence {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

const SIMULATE: &str = "\
Based on the protocol analysis, simulate running this biological experiment:

- Generate realistic data points based on the experimental conditions
- Consider biological variability and potential experimental errors
- Include appropriate controls and replicates
- Account for time-dependent changes if applicable
- Generate raw data in a format suitable for analysis

Use your knowledge of biological systems to create plausible results.";

const COLLECT: &str = "\
Take the simulated experimental data and organize it systematically:

- Structure data in appropriate formats (tables, matrices)
- Add metadata (timestamps, conditions, sample IDs)
- Ensure data quality and consistency
- Create data dictionaries explaining variables
- Organize files in a logical directory structure

Prepare the data for statistical analysis.";

const ANALYZE: &str = "\
Perform comprehensive analysis of the experimental data:

- Calculate descriptive statistics
- Perform appropriate statistical tests
- Identify significant patterns or differences
- Create informative visualizations (bar charts, line graphs, heatmaps)
- Generate figures with proper labels and legends
- Assess data quality and potential outliers

Present findings in a clear, scientific manner.";

const REPORT: &str = "\
Create a comprehensive experiment report including:

- Executive summary of findings
- Methods section (based on protocol)
- Results section (incorporating analysis and figures)
- Discussion of biological significance
- Limitations of the virtual experiment
- Specific recommendations for next experiments
- Suggestions for protocol improvements

Write in standard scientific report format.";

/// Build the five-stage pipeline for an experiment description.
///
/// The description is embedded verbatim in the first stage only; later
/// stages work from the output handed to them.
pub fn build_pipeline(description: &str) -> StageSequence {
    let protocol = format!(
        "Read and analyze the following experiment: {description}\n\n\
         Extract and organize:\n\
         - Objective of the experiment\n\
         - Required materials and reagents\n\
         - Step-by-step procedure\n\
         - Expected timeline\n\
         - Critical parameters (temperature, pH, concentrations, etc.)\n\
         - Safety considerations\n\n\
         Present this information in a structured format that other agents can easily follow."
    );

    let simulate = format!("{SIMULATE}\n\n{}", reference::reference_sheet());

    StageSequence {
        experiment: description.to_string(),
        stages: [
            Stage {
                role: Role::ProtocolRead,
                instruction: protocol,
                expected_output: "A structured breakdown of the experimental protocol with all key details organized",
            },
            Stage {
                role: Role::Simulate,
                instruction: simulate,
                expected_output: "Simulated experimental data with realistic biological measurements and observations",
            },
            Stage {
                role: Role::Collect,
                instruction: COLLECT.to_string(),
                expected_output: "Well-organized dataset with proper structure, labels, and metadata",
            },
            Stage {
                role: Role::Analyze,
                instruction: ANALYZE.to_string(),
                expected_output: "Statistical analysis results with publication-quality figures and interpretation",
            },
            Stage {
                role: Role::Report,
                instruction: REPORT.to_string(),
                expected_output: "Complete scientific report with conclusions and actionable next steps",
            },
        ],
        protocol_file: None,
    }
}
