//! Interactive command loop over any reader/writer pair.

use std::io::{self, BufRead, Write};

use crate::crew::ExecutionService;
use crate::lab::{ExperimentRun, VirtualLab};
use crate::run::RunResult;

pub const PROMPT: &str = "Virtual Lab > ";
pub const CUSTOM_PROMPT: &str = "Experiment > ";

const HELP: &str = "\
Available commands:
- 'list': Show all available experiments
- 'run <experiment_name>': Run specific experiment
- 'run_all': Run all experiments
- 'custom': Run a custom experiment
- 'help': Show this message
- 'quit' or 'exit': Exit the lab";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Run(String),
    RunAll,
    Custom,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    /// Parse one input line. Matching is case-insensitive.
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_lowercase();
        match line.as_str() {
            "" => Command::Empty,
            "list" => Command::List,
            "run_all" => Command::RunAll,
            "custom" => Command::Custom,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => match line.strip_prefix("run ") {
                Some(name) => Command::Run(name.trim().to_string()),
                None => Command::Unknown(line),
            },
        }
    }
}

/// Read commands from `input` until `quit`/`exit` or end of input.
pub fn run_repl<E, R, W>(lab: &mut VirtualLab<E>, lab_name: &str, mut input: R, mut out: W) -> io::Result<()>
where
    E: ExecutionService,
    R: BufRead,
    W: Write,
{
    writeln!(out, "Welcome to {lab_name}!")?;
    writeln!(out, "Type 'help' for commands or 'quit' to exit")?;

    loop {
        write!(out, "\n{PROMPT}")?;
        out.flush()?;

        let Some(line) = read_line(&mut input)? else {
            writeln!(out)?;
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Help => writeln!(out, "\n{HELP}")?,
            Command::List => {
                writeln!(out, "Available virtual experiments:")?;
                writeln!(out, "{}", "-".repeat(40))?;
                for row in lab.list_experiments() {
                    writeln!(out, "{}. {} ({})", row.index, row.title, row.name)?;
                    writeln!(out, "   {}\n", row.headline)?;
                }
            }
            Command::Run(name) => match lab.run_experiment(&name, true) {
                Ok(run) => print_run(&mut out, &run)?,
                Err(e) => {
                    writeln!(out, "Experiment '{}' not found!", e.name)?;
                    writeln!(out, "Available experiments: {}", e.available.join(", "))?;
                }
            },
            Command::RunAll => {
                writeln!(out, "Running all virtual experiments")?;
                let runs = lab.run_all_experiments();
                for run in &runs {
                    print_run(&mut out, run)?;
                }
                let ok = runs.iter().filter(|r| r.result.is_success()).count();
                writeln!(out, "\n{ok}/{} experiments succeeded", runs.len())?;
            }
            Command::Custom => {
                writeln!(out, "Enter your custom experiment description:")?;
                write!(out, "{CUSTOM_PROMPT}")?;
                out.flush()?;
                match read_line(&mut input)? {
                    Some(description) if !description.trim().is_empty() => {
                        let result = lab.run_custom(description.trim());
                        print_result(&mut out, "custom experiment", &result)?;
                    }
                    Some(_) => writeln!(out, "No description given.")?,
                    None => {
                        writeln!(out)?;
                        break;
                    }
                }
            }
            Command::Unknown(_) => {
                writeln!(out, "Unknown command. Type 'help' for available commands.")?
            }
        }
    }

    writeln!(out, "Thanks for using the Virtual Biology Lab!")?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn print_run<W: Write>(out: &mut W, run: &ExperimentRun) -> io::Result<()> {
    print_result(out, run.name, &run.result)?;
    if let Some(path) = &run.saved_to {
        writeln!(out, "Results saved to: {}", path.display())?;
    }
    Ok(())
}

fn print_result<W: Write>(out: &mut W, label: &str, result: &RunResult) -> io::Result<()> {
    match (result.results(), result.error()) {
        (Some(report), _) => {
            writeln!(out, "\n{label} completed successfully\n")?;
            writeln!(out, "{}", report.trim())
        }
        (None, error) => writeln!(
            out,
            "\n{label} failed: {}",
            error.unwrap_or("unknown error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabConfig;
    use crate::run::tests::MockService;

    fn lab(service: MockService) -> (tempfile::TempDir, VirtualLab<MockService>) {
        let tmp = tempfile::tempdir().unwrap();
        let config = LabConfig {
            results_dir: tmp.path().join("results"),
            protocols_dir: tmp.path().join("protocols"),
            ..LabConfig::default()
        };
        std::fs::create_dir(&config.results_dir).unwrap();
        (tmp, VirtualLab::new(&config, service))
    }

    fn session(lab: &mut VirtualLab<MockService>, input: &str) -> String {
        let mut out = Vec::new();
        run_repl(lab, "Test Lab", input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // --- Command::parse ---

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("list"), Command::List);
        assert_eq!(Command::parse("  LIST \n"), Command::List);
        assert_eq!(Command::parse("run_all"), Command::RunAll);
        assert_eq!(Command::parse("custom"), Command::Custom);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse("EXIT"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Empty);
    }

    #[test]
    fn parse_run_takes_lowercased_name() {
        assert_eq!(
            Command::parse("run Drug_Screening"),
            Command::Run("drug_screening".into())
        );
        assert_eq!(Command::parse("run    "), Command::Unknown("run".into()));
        assert_eq!(Command::parse("dance"), Command::Unknown("dance".into()));
    }

    // --- sessions ---

    #[test]
    fn quit_ends_session() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "quit\nlist\n");
        assert!(out.contains("Welcome to Test Lab!"));
        assert!(!out.contains("Available virtual experiments"));
        assert!(out.ends_with("Thanks for using the Virtual Biology Lab!\n"));
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "help\n");
        assert!(out.contains("'run_all': Run all experiments"));
        assert!(out.contains("Thanks for using"));
    }

    #[test]
    fn list_prints_every_experiment() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "list\nquit\n");
        assert!(out.contains("1. Drug Screening (drug_screening)"));
        assert!(out.contains("5. Ph Optimization (ph_optimization)"));
    }

    #[test]
    fn run_unknown_lists_known_names() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "run nonexistent\nquit\n");

        assert!(out.contains("Experiment 'nonexistent' not found!"));
        for name in lab.catalog().names() {
            assert!(out.contains(name), "missing {name}");
        }
        assert!(lab.service().calls.is_empty());
    }

    #[test]
    fn run_prints_report_and_saved_path() {
        let (_tmp, mut lab) = lab(MockService::ok("Final report: IC50 = 42 μM"));
        let out = session(&mut lab, "run drug_screening\nquit\n");
        assert!(out.contains("drug_screening completed successfully"));
        assert!(out.contains("Final report: IC50 = 42 μM"));
        assert!(out.contains("Results saved to:"));
    }

    #[test]
    fn run_all_reports_each_failure() {
        let (_tmp, mut lab) = lab(MockService::failing("rate limited"));
        let out = session(&mut lab, "run_all\nquit\n");
        assert_eq!(out.matches("failed: rate limited").count(), 5);
        assert!(out.contains("0/5 experiments succeeded"));
        assert!(!out.contains("Results saved to:"));
    }

    #[test]
    fn custom_reads_next_line() {
        let (_tmp, mut lab) = lab(MockService::ok("yeast report"));
        let out = session(&mut lab, "custom\nTest caffeine on yeast\nquit\n");
        assert!(out.contains(CUSTOM_PROMPT));
        assert!(out.contains("custom experiment completed successfully"));
        assert!(out.contains("yeast report"));
        assert_eq!(lab.service().calls.len(), 1);
    }

    #[test]
    fn custom_blank_description_is_ignored() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "custom\n   \nquit\n");
        assert!(out.contains("No description given."));
        assert!(lab.service().calls.is_empty());
    }

    #[test]
    fn unknown_command_hint() {
        let (_tmp, mut lab) = lab(MockService::ok("OK"));
        let out = session(&mut lab, "dance\nquit\n");
        assert!(out.contains("Unknown command. Type 'help' for available commands."));
    }
}
